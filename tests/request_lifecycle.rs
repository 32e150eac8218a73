use crux_core::testing::AppTester;
use usbs_core::capabilities::{
    pref_keys, AuthOutput, Document, Fields, PrefsOutput, PrefsSnapshot, StoreError,
    StoreOperation, StoreOutput,
};
use usbs_core::routing::Screen;
use usbs_core::{
    fields, messages, AdminTab, App, CategoryField, DashboardTab, Effect, Event, Model,
    RequestStatus,
};

fn request_doc(id: &str, user: &str, status: &str, submitted_at: u64) -> Document {
    let mut f = Fields::new();
    f.insert(fields::USER_ID.into(), user.into());
    f.insert(fields::CATEGORY.into(), "Medical".into());
    f.insert(fields::PROBLEM_DESCRIPTION.into(), "Need a checkup".into());
    f.insert(fields::STATUS.into(), status.into());
    f.insert(fields::SUBMITTED_AT.into(), submitted_at.into());
    Document::new(id, f)
}

fn category_doc(id: &str, name: &str, description: &str) -> Document {
    let mut f = Fields::new();
    f.insert(fields::NAME.into(), name.into());
    f.insert(fields::DESCRIPTION.into(), description.into());
    f.insert(fields::CREATED_AT.into(), 1_000u64.into());
    Document::new(id, f)
}

fn dashboard_ready(user: &str) -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::AppStarted {
            url: "/".to_string(),
        },
        &mut model,
    );
    let snapshot = PrefsSnapshot::new()
        .with(pref_keys::LANGUAGE, "en")
        .with(pref_keys::LANGUAGE_SELECTED, "true")
        .with(pref_keys::THEME, "light")
        .with(pref_keys::THEME_SELECTED, "true")
        .with(pref_keys::ONBOARDING_COMPLETED, "true")
        .with(pref_keys::CURRENT_USER, user);
    app.update(
        Event::PreferencesLoaded {
            result: Box::new(Ok(PrefsOutput::Snapshot(snapshot))),
        },
        &mut model,
    );
    assert_eq!(model.screen, Screen::Dashboard);
    (app, model)
}

fn admin_ready() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::AppStarted {
            url: "/?viewType=admin".to_string(),
        },
        &mut model,
    );
    let snapshot = PrefsSnapshot::new()
        .with(pref_keys::LANGUAGE, "en")
        .with(pref_keys::LANGUAGE_SELECTED, "true")
        .with(pref_keys::THEME, "light")
        .with(pref_keys::THEME_SELECTED, "true");
    app.update(
        Event::PreferencesLoaded {
            result: Box::new(Ok(PrefsOutput::Snapshot(snapshot))),
        },
        &mut model,
    );
    assert_eq!(model.screen, Screen::AdminLogin);

    app.update(
        Event::AdminLoginFieldChanged {
            field: usbs_core::LoginField::Email,
            value: "admin@example.org".to_string(),
        },
        &mut model,
    );
    app.update(
        Event::AdminLoginFieldChanged {
            field: usbs_core::LoginField::Password,
            value: "secret".to_string(),
        },
        &mut model,
    );
    app.update(Event::AdminLoginSubmitted, &mut model);
    app.update(
        Event::AdminLoginCompleted {
            result: Box::new(Ok(AuthOutput::SignedIn {
                uid: "admin-1".to_string(),
            })),
        },
        &mut model,
    );
    app.update(
        Event::AdminGateChecked {
            result: Box::new(Ok(StoreOutput::Document(Some(Document::new(
                "admin-1",
                Fields::new(),
            ))))),
        },
        &mut model,
    );
    assert_eq!(model.screen, Screen::AdminDashboard);
    assert!(model.session.admin_verified);
    (app, model)
}

#[test]
fn test_dashboard_snapshot_sorts_newest_first() {
    let (app, mut model) = dashboard_ready("9876543210");
    let token = model.dashboard.watch.clone().expect("watch armed");

    app.update(
        Event::RequestsSnapshot {
            result: Box::new(Ok(StoreOutput::Snapshot {
                token,
                documents: vec![
                    request_doc("old", "9876543210", "Pending", 100),
                    request_doc("new", "9876543210", "Pending", 300),
                    request_doc("mid", "9876543210", "Pending", 200),
                ],
            })),
        },
        &mut model,
    );

    let ids: Vec<&str> = model
        .dashboard
        .requests
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(ids, ["new", "mid", "old"]);
    assert!(!model.dashboard.is_loading);
}

#[test]
fn test_status_change_reaches_live_dashboard_without_reload() {
    let (app, mut model) = dashboard_ready("9876543210");
    let token = model.dashboard.watch.clone().expect("watch armed");

    app.update(
        Event::RequestsSnapshot {
            result: Box::new(Ok(StoreOutput::Snapshot {
                token: token.clone(),
                documents: vec![request_doc("r1", "9876543210", "Pending", 100)],
            })),
        },
        &mut model,
    );
    assert_eq!(
        model.dashboard.requests[0].status,
        RequestStatus::Pending
    );

    // an administrator resolves the request directly; the watch pushes the
    // new state
    app.update(
        Event::RequestsSnapshot {
            result: Box::new(Ok(StoreOutput::Snapshot {
                token,
                documents: vec![request_doc("r1", "9876543210", "Resolved", 100)],
            })),
        },
        &mut model,
    );
    assert_eq!(
        model.dashboard.requests[0].status,
        RequestStatus::Resolved
    );
}

#[test]
fn test_stale_snapshot_from_released_watch_is_ignored() {
    let (app, mut model) = dashboard_ready("9876543210");

    app.update(
        Event::RequestsSnapshot {
            result: Box::new(Ok(StoreOutput::Snapshot {
                token: usbs_core::capabilities::WatchToken("stale".to_string()),
                documents: vec![request_doc("r1", "9876543210", "Pending", 100)],
            })),
        },
        &mut model,
    );
    assert!(model.dashboard.requests.is_empty());
}

#[test]
fn test_watch_failure_raises_network_banner_and_keeps_data() {
    let (app, mut model) = dashboard_ready("9876543210");
    let token = model.dashboard.watch.clone().expect("watch armed");

    app.update(
        Event::RequestsSnapshot {
            result: Box::new(Ok(StoreOutput::Snapshot {
                token,
                documents: vec![request_doc("r1", "9876543210", "Pending", 100)],
            })),
        },
        &mut model,
    );
    app.update(
        Event::RequestsSnapshot {
            result: Box::new(Err(StoreError::network("listener dropped"))),
        },
        &mut model,
    );

    assert!(model.dashboard.network_error);
    // prior data stays displayed
    assert_eq!(model.dashboard.requests.len(), 1);
}

#[test]
fn test_offline_delete_is_refused_up_front() {
    let (app, mut model) = dashboard_ready("9876543210");

    app.update(Event::NetworkStatusChanged { online: false }, &mut model);
    app.update(
        Event::DeleteRequested {
            id: "r1".to_string(),
        },
        &mut model,
    );
    let update = app.update(
        Event::DeleteConfirmed {
            id: "r1".to_string(),
        },
        &mut model,
    );

    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::NO_CONNECTIVITY)
    );
    assert!(!update.effects.iter().any(|e| {
        matches!(
            e,
            Effect::Store(request)
                if matches!(request.operation, StoreOperation::Delete { .. })
        )
    }));
}

#[test]
fn test_online_delete_issues_store_delete() {
    let (app, mut model) = dashboard_ready("9876543210");

    app.update(
        Event::DeleteRequested {
            id: "r1".to_string(),
        },
        &mut model,
    );
    let update = app.update(
        Event::DeleteConfirmed {
            id: "r1".to_string(),
        },
        &mut model,
    );
    assert!(update.effects.iter().any(|e| {
        matches!(
            e,
            Effect::Store(request)
                if matches!(request.operation, StoreOperation::Delete { .. })
        )
    }));

    app.update(
        Event::DeleteCompleted {
            result: Box::new(Ok(StoreOutput::Deleted {
                id: "r1".to_string(),
            })),
        },
        &mut model,
    );
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::REQUEST_DELETED)
    );
}

#[test]
fn test_new_request_draft_requires_both_fields_and_connectivity() {
    let (app, mut model) = dashboard_ready("9876543210");

    app.update(
        Event::DashboardTabSelected {
            tab: DashboardTab::New,
        },
        &mut model,
    );
    app.update(
        Event::DraftFieldChanged {
            field: usbs_core::DraftField::Category,
            value: "Medical".to_string(),
        },
        &mut model,
    );

    // description missing
    let update = app.update(Event::DraftSubmitted, &mut model);
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::FILL_ALL_FIELDS)
    );
    assert!(!update.effects.iter().any(|e| {
        matches!(
            e,
            Effect::Store(request)
                if matches!(request.operation, StoreOperation::Create { .. })
        )
    }));

    app.update(
        Event::DraftFieldChanged {
            field: usbs_core::DraftField::Description,
            value: "Follow-up visit".to_string(),
        },
        &mut model,
    );
    app.update(Event::NetworkStatusChanged { online: false }, &mut model);
    app.update(Event::DraftSubmitted, &mut model);
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::NO_CONNECTIVITY)
    );

    app.update(Event::NetworkStatusChanged { online: true }, &mut model);
    app.update(Event::DraftSubmitted, &mut model);
    assert!(model.dashboard.draft.is_submitting);

    app.update(
        Event::DraftSubmitCompleted {
            result: Box::new(Ok(StoreOutput::Created {
                id: "r2".to_string(),
            })),
        },
        &mut model,
    );
    assert!(!model.dashboard.draft.is_submitting);
    assert_eq!(model.dashboard.draft.category, "");
    assert_eq!(model.dashboard.active_tab, DashboardTab::Requests);
}

#[test]
fn test_logout_clears_identity_and_returns_to_onboarding() {
    let (app, mut model) = dashboard_ready("9876543210");

    app.update(Event::LogoutRequested, &mut model);
    assert!(model.prefs.current_user.is_none());
    assert_eq!(model.screen, Screen::Onboarding);
    assert!(model.dashboard.watch.is_none());
}

#[test]
fn test_admin_sets_status_directly_from_pending_to_resolved() {
    let (app, mut model) = admin_ready();

    // no transition graph: Pending → Resolved directly is accepted
    let update = app.update(
        Event::StatusChangeRequested {
            id: "r1".to_string(),
            status: RequestStatus::Resolved,
        },
        &mut model,
    );
    let updated_fields = update
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::Store(request) => match &request.operation {
                StoreOperation::Update { id, fields, .. } if id == "r1" => Some(fields.clone()),
                _ => None,
            },
            _ => None,
        })
        .expect("an update operation was issued");
    assert_eq!(
        updated_fields.get(fields::STATUS).and_then(|v| v.as_str()),
        Some(RequestStatus::Resolved.as_str())
    );
    assert!(updated_fields.contains_key(fields::LAST_UPDATED_AT));

    app.update(
        Event::StatusChangeCompleted {
            result: Box::new(Ok(StoreOutput::Updated {
                id: "r1".to_string(),
            })),
        },
        &mut model,
    );
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::STATUS_UPDATED)
    );
}

#[test]
fn test_admin_watches_all_requests() {
    let (app, mut model) = admin_ready();
    let token = model.admin.requests_watch.clone().expect("watch armed");

    app.update(
        Event::AdminRequestsSnapshot {
            result: Box::new(Ok(StoreOutput::Snapshot {
                token,
                documents: vec![
                    request_doc("a", "1111111111", "Pending", 100),
                    request_doc("b", "2222222222", "Resolved", 300),
                ],
            })),
        },
        &mut model,
    );
    assert_eq!(model.admin.requests.len(), 2);
    assert_eq!(model.admin.requests[0].id.as_str(), "b");
}

#[test]
fn test_unprivileged_login_is_rejected_without_partial_session() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::AppStarted {
            url: "/?viewType=admin".to_string(),
        },
        &mut model,
    );
    let snapshot = PrefsSnapshot::new()
        .with(pref_keys::LANGUAGE_SELECTED, "true")
        .with(pref_keys::THEME_SELECTED, "true");
    app.update(
        Event::PreferencesLoaded {
            result: Box::new(Ok(PrefsOutput::Snapshot(snapshot))),
        },
        &mut model,
    );

    app.update(
        Event::AdminLoginFieldChanged {
            field: usbs_core::LoginField::Email,
            value: "user@example.org".to_string(),
        },
        &mut model,
    );
    app.update(
        Event::AdminLoginFieldChanged {
            field: usbs_core::LoginField::Password,
            value: "secret".to_string(),
        },
        &mut model,
    );
    app.update(Event::AdminLoginSubmitted, &mut model);
    app.update(
        Event::AdminLoginCompleted {
            result: Box::new(Ok(AuthOutput::SignedIn {
                uid: "user-1".to_string(),
            })),
        },
        &mut model,
    );

    // authenticated but absent from the privileged-principal registry
    let update = app.update(
        Event::AdminGateChecked {
            result: Box::new(Ok(StoreOutput::Document(None))),
        },
        &mut model,
    );

    assert_eq!(model.screen, Screen::AdminLogin);
    assert!(!model.session.admin_verified);
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::NOT_AUTHORIZED)
    );
    // the half-established principal is signed out again
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Auth(_))));
}

#[test]
fn test_category_create_edit_and_listing_round_trip() {
    let (app, mut model) = admin_ready();

    app.update(
        Event::AdminTabSelected {
            tab: AdminTab::Categories,
        },
        &mut model,
    );

    // create
    app.update(
        Event::CategoryDraftChanged {
            field: CategoryField::Name,
            value: "Legal".to_string(),
        },
        &mut model,
    );
    app.update(
        Event::CategoryDraftChanged {
            field: CategoryField::Description,
            value: "Legal aid".to_string(),
        },
        &mut model,
    );
    let update = app.update(Event::CategoryCreateRequested, &mut model);
    assert!(update.effects.iter().any(|e| {
        matches!(
            e,
            Effect::Store(request)
                if matches!(request.operation, StoreOperation::Create { .. })
        )
    }));
    app.update(
        Event::CategoryCreateCompleted {
            result: Box::new(Ok(StoreOutput::Created {
                id: "c1".to_string(),
            })),
        },
        &mut model,
    );
    assert_eq!(model.admin.category_draft.name, "");

    // the live watch reflects the stored record with identical field values
    let token = model.admin.categories_watch.clone().expect("watch armed");
    app.update(
        Event::AdminCategoriesSnapshot {
            result: Box::new(Ok(StoreOutput::Snapshot {
                token: token.clone(),
                documents: vec![category_doc("c1", "Legal", "Legal aid")],
            })),
        },
        &mut model,
    );
    assert_eq!(model.categories.len(), 1);
    assert_eq!(model.categories[0].name, "Legal");
    assert_eq!(model.categories[0].description, "Legal aid");

    // edit only the description
    app.update(
        Event::CategoryEditStarted {
            id: "c1".to_string(),
        },
        &mut model,
    );
    app.update(
        Event::CategoryEditChanged {
            field: CategoryField::Description,
            value: "Free legal aid".to_string(),
        },
        &mut model,
    );
    let update = app.update(Event::CategoryEditSaved, &mut model);
    let updated_fields = update
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::Store(request) => match &request.operation {
                StoreOperation::Update { id, fields, .. } if id == "c1" => Some(fields.clone()),
                _ => None,
            },
            _ => None,
        })
        .expect("an update operation was issued");
    assert_eq!(
        updated_fields.get(fields::NAME).and_then(|v| v.as_str()),
        Some("Legal")
    );
    assert_eq!(
        updated_fields
            .get(fields::DESCRIPTION)
            .and_then(|v| v.as_str()),
        Some("Free legal aid")
    );

    app.update(
        Event::CategoryUpdateCompleted {
            result: Box::new(Ok(StoreOutput::Updated {
                id: "c1".to_string(),
            })),
        },
        &mut model,
    );
    assert!(model.admin.editing.is_none());

    app.update(
        Event::AdminCategoriesSnapshot {
            result: Box::new(Ok(StoreOutput::Snapshot {
                token,
                documents: vec![category_doc("c1", "Legal", "Free legal aid")],
            })),
        },
        &mut model,
    );
    assert_eq!(model.categories[0].description, "Free legal aid");
}

#[test]
fn test_blank_category_name_is_rejected() {
    let (app, mut model) = admin_ready();

    app.update(
        Event::CategoryDraftChanged {
            field: CategoryField::Name,
            value: "   ".to_string(),
        },
        &mut model,
    );
    let update = app.update(Event::CategoryCreateRequested, &mut model);

    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::CATEGORY_NAME_REQUIRED)
    );
    assert!(!update.effects.iter().any(|e| {
        matches!(
            e,
            Effect::Store(request)
                if matches!(request.operation, StoreOperation::Create { .. })
        )
    }));
}

#[test]
fn test_category_delete_is_unconditional() {
    let (app, mut model) = admin_ready();

    let update = app.update(
        Event::CategoryDeleteRequested {
            id: "c1".to_string(),
        },
        &mut model,
    );
    assert!(update.effects.iter().any(|e| {
        matches!(
            e,
            Effect::Store(request)
                if matches!(request.operation, StoreOperation::Delete { .. })
        )
    }));

    app.update(
        Event::CategoryDeleteCompleted {
            result: Box::new(Ok(StoreOutput::Deleted {
                id: "c1".to_string(),
            })),
        },
        &mut model,
    );
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::CATEGORY_DELETED)
    );
}

#[test]
fn test_admin_logout_releases_watches_and_returns_to_login() {
    let (app, mut model) = admin_ready();
    assert!(model.admin.requests_watch.is_some());

    app.update(Event::AdminLogoutRequested, &mut model);
    assert_eq!(model.screen, Screen::AdminLogin);
    assert!(model.admin.requests_watch.is_none());
    assert!(model.admin.categories_watch.is_none());
    assert!(!model.session.admin_verified);
}
