/// Unit tests for DiError and DiResult types

use scoped_di::{
    ComponentCollection, DiError, DiResult, LifecyclePhase, RequestContext, Resolver, ScopeKind,
};
use std::error::Error;

#[test]
fn test_error_display_not_registered() {
    let error = DiError::NotRegistered("paymentService".to_string());
    assert_eq!(error.to_string(), "Component not registered: paymentService");
}

#[test]
fn test_error_display_scope_not_active() {
    let error = DiError::ScopeNotActive {
        name: "sessionTracker".to_string(),
        scope: ScopeKind::Session,
    };
    assert_eq!(
        error.to_string(),
        "Scope 'session' is not active for component 'sessionTracker'"
    );
}

#[test]
fn test_error_display_double_destroy_names_instance() {
    let mut components = ComponentCollection::new();
    let key = components.add_prototype("transaction", |_| ()).unwrap();
    let registry = components.build().unwrap();
    let instance = registry.get(&key).unwrap();
    registry.destroy(&instance).unwrap();

    let error = registry.destroy(&instance).unwrap_err();
    assert_eq!(
        error.to_string(),
        format!(
            "Component 'transaction' instance {} has already been destroyed",
            instance.id()
        )
    );
}

#[test]
fn test_error_display_container_managed() {
    let error = DiError::ContainerManaged {
        name: "requestTracker".to_string(),
        scope: ScopeKind::Request,
    };
    assert_eq!(
        error.to_string(),
        "Component 'requestTracker' is owned by the request scope and cannot be destroyed manually"
    );
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch {
        name: "greeting".to_string(),
        expected: "u32",
    };
    assert_eq!(
        error.to_string(),
        "Type mismatch for component 'greeting': expected u32"
    );
}

#[test]
fn test_error_display_circular() {
    let error = DiError::Circular(vec!["a".into(), "b".into(), "a".into()]);
    assert_eq!(error.to_string(), "Circular dependency: a -> b -> a");
}

#[test]
fn test_error_display_callback_failed() {
    let error = DiError::CallbackFailed {
        name: "auditLogger".to_string(),
        phase: LifecyclePhase::PreDestroy,
        message: "flush failed".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Lifecycle phase pre-destroy failed for component 'auditLogger': flush failed"
    );
}

#[test]
fn test_error_display_misc() {
    assert_eq!(DiError::DepthExceeded(1024).to_string(), "Max depth 1024 exceeded");
    assert_eq!(
        DiError::DuplicateDefinition("cart".into()).to_string(),
        "Duplicate component definition: cart"
    );
    assert_eq!(
        DiError::ProxyUnavailable {
            name: "auditLogger".into(),
            scope: ScopeKind::Singleton
        }
        .to_string(),
        "No scoped proxy for component 'auditLogger' with singleton scope"
    );
    assert_eq!(DiError::RegistryClosed.to_string(), "Registry has been torn down");
    assert_eq!(DiError::UnknownScope("thread".into()).to_string(), "Unknown scope: thread");
    assert_eq!(
        DiError::Config("bad".into()).to_string(),
        "Configuration error: bad"
    );
}

#[test]
fn test_error_is_std_error_and_clone() {
    let error = DiError::RegistryClosed;
    let boxed: Box<dyn Error + Send + Sync> = Box::new(error.clone());
    assert!(boxed.source().is_none());
    assert_eq!(boxed.to_string(), error.to_string());
}

#[test]
fn test_di_result_propagates_with_question_mark() {
    fn resolve_tracker() -> DiResult<()> {
        let mut components = ComponentCollection::new();
        let key = components.add_request("requestTracker", |_| ())?;
        let registry = components.build()?;
        let _guard = RequestContext::new().enter();
        registry.get(&key)?;
        Ok(())
    }

    assert!(resolve_tracker().is_ok());
}
