use csp_portal::{
    ConfigError, ResolvedRole, Role, RoleRegistry,
    roles::parse_aliases,
};

#[test]
fn test_default_registry_resolves_auditor_alias() {
    let registry = RoleRegistry::default();

    assert_eq!(
        registry.resolve_role("auditor"),
        ResolvedRole::Known(Role::FieldAuditor)
    );
    assert_eq!(
        registry.resolve_role("field_auditor"),
        ResolvedRole::Known(Role::FieldAuditor)
    );
}

#[test]
fn test_resolution_is_idempotent_for_every_role() {
    let registry = RoleRegistry::default();

    for role in Role::ALL {
        let once = registry.canonical(role);
        assert_eq!(registry.canonical(once), once, "{role} resolved twice differs");
        assert!(registry.is_canonical(once));
    }
}

#[test]
fn test_unknown_strings_resolve_to_unknown() {
    let registry = RoleRegistry::default();

    for raw in ["", "root", "superuser", "*", "admin2", "adm in"] {
        assert_eq!(registry.resolve_role(raw), ResolvedRole::Unknown, "'{raw}'");
    }
}

#[test]
fn test_near_miss_spellings_are_unknown() {
    let registry = RoleRegistry::default();

    for raw in [
        "ADMIN",
        "Admin",
        " admin",
        "admin ",
        "csp-agent",
        "CSP_AGENT",
        "Field-Auditor",
        "bank-officer",
    ] {
        assert_eq!(registry.resolve_role(raw), ResolvedRole::Unknown, "'{raw}'");
    }
    assert_eq!(registry.resolve_role("csp_agent"), ResolvedRole::Known(Role::CspAgent));
}

#[test]
fn test_role_names_match_serde_names() {
    for role in Role::ALL {
        let wire: String = serde_json::from_value(serde_json::to_value(role).unwrap()).unwrap();
        assert_eq!(wire.parse::<Role>(), Ok(role));
    }
}

#[test]
fn test_canonical_roles_exclude_aliases() {
    let registry = RoleRegistry::default();
    let canonical = registry.canonical_roles();

    assert_eq!(canonical.len(), Role::ALL.len() - 1);
    assert!(!canonical.contains(&Role::Auditor));
    assert!(canonical.contains(&Role::FieldAuditor));
    assert_eq!(registry.aliases_of(Role::FieldAuditor), vec![Role::Auditor]);
}

#[test]
fn test_alias_chains_collapse() {
    let registry =
        RoleRegistry::new([(Role::Auditor, Role::FieldAuditor), (Role::FiAgent, Role::Auditor)])
            .unwrap();

    assert_eq!(registry.canonical(Role::FiAgent), Role::FieldAuditor);
    assert_eq!(
        registry.resolve_role("fi_agent"),
        ResolvedRole::Known(Role::FieldAuditor)
    );
}

#[test]
fn test_alias_cycle_is_rejected() {
    let result = RoleRegistry::new([
        (Role::Auditor, Role::FieldAuditor),
        (Role::FieldAuditor, Role::Auditor),
    ]);

    assert!(matches!(result, Err(ConfigError::AliasCycle { .. })));
}

#[test]
fn test_self_alias_is_a_cycle() {
    let result = RoleRegistry::new([(Role::Hr, Role::Hr)]);

    assert_eq!(result, Err(ConfigError::AliasCycle { role: Role::Hr }));
}

#[test]
fn test_extra_aliases_are_validated_with_builtin() {
    // field_auditor -> auditor closes a loop with the built-in auditor -> field_auditor.
    let result = RoleRegistry::with_extra_aliases([(Role::FieldAuditor, Role::Auditor)]);
    assert!(matches!(result, Err(ConfigError::AliasCycle { .. })));

    let registry = RoleRegistry::with_extra_aliases([(Role::FiAgent, Role::CspAgent)]).unwrap();
    assert_eq!(registry.canonical(Role::FiAgent), Role::CspAgent);
    assert_eq!(registry.canonical(Role::Auditor), Role::FieldAuditor);
}

#[test]
fn test_parse_aliases() {
    let pairs = parse_aliases("auditor=field_auditor, fi_agent = csp_agent ,").unwrap();
    assert_eq!(
        pairs,
        vec![
            (Role::Auditor, Role::FieldAuditor),
            (Role::FiAgent, Role::CspAgent)
        ]
    );

    assert!(parse_aliases("").unwrap().is_empty());
    assert_eq!(
        parse_aliases("auditor"),
        Err(ConfigError::InvalidAlias("auditor".to_string()))
    );
    assert!(matches!(
        parse_aliases("ghost=admin"),
        Err(ConfigError::UnknownRoleName(_))
    ));
}

#[test]
fn test_role_serializes_as_snake_case() {
    assert_eq!(serde_json::to_string(&Role::CustomerSupport).unwrap(), r#""customer_support""#);
    let parsed: Role = serde_json::from_str(r#""it_infra""#).unwrap();
    assert_eq!(parsed, Role::ItInfra);
}
