use bcd_ir::IrError;
use bcd_ir::descriptor::{MethodDescriptor, internal_name, is_wide, type_name};

#[test]
fn parses_mixed_parameters() {
    let desc = MethodDescriptor::parse("(I[Ljava/lang/String;J[[D)V").unwrap();
    assert_eq!(desc.params, ["I", "[Ljava/lang/String;", "J", "[[D"]);
    assert!(desc.returns_void());
}

#[test]
fn parses_object_return() {
    let desc = MethodDescriptor::parse("()Ljava/lang/Object;").unwrap();
    assert!(desc.params.is_empty());
    assert_eq!(desc.ret, "Ljava/lang/Object;");
}

#[test]
fn rejects_malformed() {
    for bad in ["", "I", "(I", "(Q)V", "(L;)V", "()", "()VV"] {
        assert_eq!(
            MethodDescriptor::parse(bad),
            Err(IrError::InvalidDescriptor(bad.to_string())),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn field_type_helpers() {
    assert!(is_wide("J"));
    assert!(is_wide("D"));
    assert!(!is_wide("I"));
    assert_eq!(internal_name("Ljava/util/List;"), "java/util/List");
    assert_eq!(type_name("[Ljava/lang/String;"), "java.lang.String[]");
    assert_eq!(type_name("Z"), "boolean");
}
