use super::common::*;
use crate::identity::{
    ClientKind, IdentityError, IdentityRepository, NewClient, RoleInput, UserId,
    DEFAULT_PERMISSIONS, DEFAULT_ROLES,
};
use crate::store::RepositoryError;

#[test]
fn seeding_twice_keeps_one_catalogue() {
    let (service, store) = build_service();
    let again = service.seed_defaults().expect("second seed");

    assert_eq!(again.permissions, DEFAULT_PERMISSIONS.len());
    assert_eq!(store.permissions().expect("permissions").len(), DEFAULT_PERMISSIONS.len());

    let roles = service.roles().expect("roles");
    assert_eq!(roles.len(), DEFAULT_ROLES.len());
    let levels: Vec<u8> = roles.iter().map(|view| view.role.level).collect();
    assert_eq!(levels, vec![1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(roles[0].role.slug, "general-manager");
    assert_eq!(roles[0].permissions.len(), DEFAULT_PERMISSIONS.len());
    assert_eq!(roles[1].permissions.len(), DEFAULT_PERMISSIONS.len() - 2);
    assert!(!roles[1]
        .permissions
        .iter()
        .any(|permission| permission.name == "settings.update"));
}

#[test]
fn permissions_group_by_module() {
    let (service, _) = build_service();
    let groups = service.permissions_by_module().expect("groups");

    let modules: Vec<&str> = groups.iter().map(|group| group.module.as_str()).collect();
    assert_eq!(
        modules,
        vec!["clients", "reports", "settings", "templates", "users", "valuations"]
    );
    let valuations = groups.last().expect("valuations group");
    assert_eq!(valuations.permissions.len(), 8);
    assert!(valuations
        .permissions
        .iter()
        .all(|permission| !permission.action.is_empty() && permission.resource == "valuations"));
}

#[test]
fn caller_permissions_are_the_union_of_roles() {
    let (service, store) = build_service();
    let user = service
        .create_employee(new_user(
            "Huda Saleh",
            "huda@valuation.test",
            vec![role_id(&store, "data-entry"), role_id(&store, "assistant-valuator")],
        ))
        .expect("employee created");

    let caller = caller_for(&service, &user);
    assert_eq!(caller.roles.len(), 2);
    assert_eq!(caller.max_role_level(), Some(7));

    let names = caller.permissions().names();
    assert_eq!(
        names,
        vec![
            "clients.create",
            "clients.read",
            "valuations.create",
            "valuations.read",
            "valuations.update",
        ]
    );
    assert!(!caller.has_permission("valuations.transfer"));
}

#[test]
fn unknown_users_do_not_resolve() {
    let (service, _) = build_service();
    assert!(service
        .resolve_caller(UserId(404))
        .expect("store available")
        .is_none());
}

#[test]
fn managers_assign_roles_to_juniors_only() {
    let (service, store) = build_service();
    let manager = employee(&service, &store, "Faisal Omar", Some("valuation-manager"));
    let senior = employee(&service, &store, "Reem Aziz", Some("senior-valuator"));
    let peer = employee(&service, &store, "Tariq Nasser", Some("valuation-manager"));
    let newcomer = employee(&service, &store, "Maha Ali", None);

    let view = service
        .assign_roles(
            &caller_for(&service, &manager),
            senior.id,
            vec![role_id(&store, "valuation-supervisor")],
        )
        .expect("manager outranks senior");
    assert_eq!(view.roles.len(), 1);
    assert_eq!(view.roles[0].slug, "valuation-supervisor");
    assert!(view.permission_names.contains(&"valuations.approve".to_string()));

    assert!(matches!(
        service.assign_roles(&caller_for(&service, &manager), peer.id, Vec::new()),
        Err(IdentityError::Forbidden(_))
    ));
    assert!(matches!(
        service.assign_roles(&caller_for(&service, &senior), manager.id, Vec::new()),
        Err(IdentityError::Forbidden(_))
    ));

    service
        .assign_roles(
            &caller_for(&service, &senior),
            newcomer.id,
            vec![role_id(&store, "data-entry")],
        )
        .expect("any role holder manages a user without roles");
    let roleless = employee(&service, &store, "Sami Yousef", None);
    assert!(matches!(
        service.assign_roles(&caller_for(&service, &roleless), newcomer.id, Vec::new()),
        Err(IdentityError::Forbidden(_))
    ));
}

#[test]
fn assigning_unknown_roles_is_a_validation_error() {
    let (service, store) = build_service();
    let manager = employee(&service, &store, "Faisal Omar", Some("general-manager"));
    let junior = employee(&service, &store, "Maha Ali", Some("data-entry"));

    match service.assign_roles(
        &caller_for(&service, &manager),
        junior.id,
        vec![crate::identity::RoleId(999)],
    ) {
        Err(IdentityError::Validation(errors)) => assert!(errors.field("role_ids").is_some()),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

fn role_input(slug: &str, level: u8) -> RoleInput {
    RoleInput {
        slug: slug.to_string(),
        name_en: "Field Auditor".to_string(),
        name_ar: None,
        description: Some("Reviews site visits".to_string()),
        level,
        is_active: true,
        permission_ids: Vec::new(),
    }
}

#[test]
fn role_levels_are_unique_and_bounded() {
    let (service, _) = build_service();

    match service.create_role(role_input("field-auditor", 3)) {
        Err(IdentityError::Validation(errors)) => assert!(errors.field("level").is_some()),
        other => panic!("expected level clash, got {other:?}"),
    }
    match service.create_role(role_input("field-auditor", 11)) {
        Err(IdentityError::Validation(errors)) => assert!(errors.field("level").is_some()),
        other => panic!("expected level range failure, got {other:?}"),
    }
    match service.create_role(role_input("data-entry", 9)) {
        Err(IdentityError::Validation(errors)) => assert!(errors.field("slug").is_some()),
        other => panic!("expected slug clash, got {other:?}"),
    }

    let created = service
        .create_role(role_input("field-auditor", 8))
        .expect("free level");
    assert_eq!(created.users_count, 0);
    assert_eq!(created.role.name_ar, "Field Auditor");

    service
        .update_role(created.role.id, role_input("field-auditor", 8))
        .expect("a role keeps its own level");
}

#[test]
fn assigned_roles_cannot_be_deleted() {
    let (service, store) = build_service();
    employee(&service, &store, "Reem Aziz", Some("senior-valuator"));

    assert!(matches!(
        service.delete_role(role_id(&store, "senior-valuator")),
        Err(IdentityError::Conflict(_))
    ));

    let unused = role_id(&store, "certified-valuator");
    service.delete_role(unused).expect("unused role deleted");
    assert!(matches!(
        service.delete_role(unused),
        Err(IdentityError::Repository(RepositoryError::NotFound("role")))
    ));
}

#[test]
fn employee_emails_are_normalised_and_unique() {
    let (service, _) = build_service();
    let user = service
        .create_employee(new_user("Omar Khalil", "  Omar@Valuation.Test ", Vec::new()))
        .expect("employee created");
    assert_eq!(user.email, "omar@valuation.test");
    assert!(user.is_active);

    match service.create_employee(new_user("Another Omar", "OMAR@valuation.test", Vec::new())) {
        Err(IdentityError::Validation(errors)) => assert!(errors.field("email").is_some()),
        other => panic!("expected duplicate email, got {other:?}"),
    }
    match service.create_employee(new_user("", "not-an-email", Vec::new())) {
        Err(IdentityError::Validation(errors)) => {
            assert!(errors.field("name").is_some());
            assert!(errors.field("email").is_some());
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn employees_cannot_toggle_themselves() {
    let (service, store) = build_service();
    let manager = employee(&service, &store, "Faisal Omar", Some("general-manager"));
    let valuer = employee(&service, &store, "Reem Aziz", Some("senior-valuator"));
    let caller = caller_for(&service, &manager);

    assert!(matches!(
        service.toggle_employee_status(&caller, manager.id),
        Err(IdentityError::Forbidden(_))
    ));

    let toggled = service
        .toggle_employee_status(&caller, valuer.id)
        .expect("deactivated");
    assert!(!toggled.is_active);
    assert!(!caller_for(&service, &valuer).is_active);

    let restored = service
        .toggle_employee_status(&caller, valuer.id)
        .expect("reactivated");
    assert!(restored.is_active);
}

#[test]
fn client_contacts_are_unique() {
    let (service, _) = build_service();
    let client = service
        .create_client(NewClient {
            name: "Gulf Housing Fund".to_string(),
            email: Some("Contact@GulfHousing.test".to_string()),
            phone: Some("0501234567".to_string()),
            kind: ClientKind::Institution,
            address: None,
        })
        .expect("client created");
    assert_eq!(client.email.as_deref(), Some("contact@gulfhousing.test"));

    match service.create_client(NewClient {
        name: "Gulf Housing Branch".to_string(),
        email: None,
        phone: Some(" 0501234567 ".to_string()),
        kind: ClientKind::Client,
        address: None,
    }) {
        Err(IdentityError::Validation(errors)) => assert!(errors.field("phone").is_some()),
        other => panic!("expected duplicate phone, got {other:?}"),
    }

    assert_eq!(
        service
            .clients(Some(ClientKind::Institution))
            .expect("clients")
            .len(),
        1
    );
    assert!(service.clients(Some(ClientKind::Client)).expect("clients").is_empty());
}

#[test]
fn viewing_another_users_access_needs_users_read() {
    let (service, store) = build_service();
    let entry = employee(&service, &store, "Maha Ali", Some("data-entry"));
    let supervisor = employee(&service, &store, "Lina Farouk", Some("valuation-supervisor"));

    assert!(matches!(
        service.user_access(&caller_for(&service, &entry), supervisor.id),
        Err(IdentityError::Forbidden(_))
    ));
    service
        .user_access(&caller_for(&service, &entry), entry.id)
        .expect("own access is always visible");
    let view = service
        .user_access(&caller_for(&service, &supervisor), entry.id)
        .expect("supervisor reads users");
    assert_eq!(view.user.id, entry.id);
}

#[test]
fn role_stats_count_assignments() {
    let (service, store) = build_service();
    employee(&service, &store, "Reem Aziz", Some("senior-valuator"));
    employee(&service, &store, "Sami Yousef", Some("senior-valuator"));
    employee(&service, &store, "Maha Ali", None);

    let stats = service.role_stats().expect("stats");
    assert_eq!(stats.total_roles, DEFAULT_ROLES.len());
    assert_eq!(stats.total_permissions, DEFAULT_PERMISSIONS.len());
    assert_eq!(stats.roles_with_users, 1);
    assert_eq!(stats.users_with_roles, 2);
    let senior = stats
        .role_distribution
        .iter()
        .find(|entry| entry.level == 4)
        .expect("senior valuator entry");
    assert_eq!(senior.users_count, 2);
}
