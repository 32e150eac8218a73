use crux_core::testing::AppTester;
use usbs_core::capabilities::{
    pref_keys, Document, Fields, PrefsOutput, PrefsSnapshot, StoreError, StoreOperation,
    StoreOutput,
};
use usbs_core::routing::Screen;
use usbs_core::wizard::{WizardField, WizardStep};
use usbs_core::{fields, messages, App, Effect, Event, Model, RequestStatus};

fn wizard_ready() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::AppStarted {
            url: "/request#mobile".to_string(),
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
    assert_eq!(model.screen, Screen::RequestWizard);
    (app, model)
}

fn set_field(app: &AppTester<App, Effect>, model: &mut Model, field: WizardField, value: &str) {
    app.update(
        Event::WizardFieldChanged {
            field,
            value: value.to_string(),
        },
        model,
    );
}

fn existing_request_doc(user: &str) -> Document {
    let mut f = Fields::new();
    f.insert(fields::USER_ID.into(), user.into());
    f.insert(fields::CATEGORY.into(), "Medical".into());
    f.insert(fields::PROBLEM_DESCRIPTION.into(), "Earlier request".into());
    f.insert(fields::STATUS.into(), "Pending".into());
    f.insert(fields::SUBMITTED_AT.into(), 1_000u64.into());
    Document::new("existing-1", f)
}

#[test]
fn test_happy_path_submits_request_and_lands_on_dashboard() {
    let (app, mut model) = wizard_ready();

    // step 0: identifier
    set_field(&app, &mut model, WizardField::MobileNumber, "9876543210");
    let update = app.update(Event::WizardNextRequested, &mut model);
    assert!(model.wizard.as_ref().unwrap().is_checking);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Store(_))));

    // no existing request, no stored profile
    app.update(
        Event::DuplicateCheckCompleted {
            result: Box::new(Ok(StoreOutput::Documents(vec![]))),
        },
        &mut model,
    );
    app.update(
        Event::ProfileLookupCompleted {
            result: Box::new(Ok(StoreOutput::Document(None))),
        },
        &mut model,
    );
    {
        let wizard = model.wizard.as_ref().unwrap();
        assert_eq!(wizard.step, WizardStep::PersonalDetails);
        assert!(!wizard.is_checking);
        assert_eq!(wizard.focus, Some(WizardField::FirstName));
    }

    // step 1: identity
    set_field(&app, &mut model, WizardField::FirstName, "Asha");
    set_field(&app, &mut model, WizardField::LastName, "Rao");
    set_field(&app, &mut model, WizardField::Gender, "female");
    app.update(Event::WizardNextRequested, &mut model);
    assert_eq!(model.wizard.as_ref().unwrap().step, WizardStep::ContactInfo);

    // step 2: contact
    set_field(&app, &mut model, WizardField::Location, "Pune");
    app.update(Event::WizardNextRequested, &mut model);
    assert_eq!(model.wizard.as_ref().unwrap().step, WizardStep::HelpNeeded);

    // step 3: help detail, then submit
    set_field(&app, &mut model, WizardField::Category, "Medical");
    set_field(
        &app,
        &mut model,
        WizardField::ProblemDescription,
        "Need a checkup",
    );
    let update = app.update(Event::WizardNextRequested, &mut model);
    assert!(model.wizard.as_ref().unwrap().is_submitting);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Store(_))));

    app.update(
        Event::WizardSubmitCompleted {
            result: Box::new(Ok(StoreOutput::Created {
                id: "req-1".to_string(),
            })),
        },
        &mut model,
    );
    assert_eq!(model.screen, Screen::Dashboard);
    assert_eq!(model.prefs.current_user.as_deref(), Some("9876543210"));
    assert!(model.wizard.is_none());
}

#[test]
fn test_invalid_step_blocks_advance_with_notice() {
    let (app, mut model) = wizard_ready();

    set_field(&app, &mut model, WizardField::MobileNumber, "123456789");
    let update = app.update(Event::WizardNextRequested, &mut model);

    let wizard = model.wizard.as_ref().unwrap();
    assert_eq!(wizard.step, WizardStep::Mobile);
    assert!(!wizard.is_checking);
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::FILL_REQUIRED_FIELDS)
    );
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::Store(_))));
}

#[test]
fn test_non_digit_mobile_is_filtered_by_input_mask() {
    let (app, mut model) = wizard_ready();
    set_field(&app, &mut model, WizardField::MobileNumber, "12345abcde");
    assert_eq!(model.wizard.as_ref().unwrap().form.mobile_number, "12345");
}

#[test]
fn test_leading_zero_identifier_is_valid() {
    let (app, mut model) = wizard_ready();
    set_field(&app, &mut model, WizardField::MobileNumber, "0123456789");
    let update = app.update(Event::WizardNextRequested, &mut model);
    assert!(model.wizard.as_ref().unwrap().is_checking);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Store(_))));
}

#[test]
fn test_duplicate_identifier_short_circuits_to_dashboard() {
    let (app, mut model) = wizard_ready();

    set_field(&app, &mut model, WizardField::MobileNumber, "9876543210");
    app.update(Event::WizardNextRequested, &mut model);

    let update = app.update(
        Event::DuplicateCheckCompleted {
            result: Box::new(Ok(StoreOutput::Documents(vec![existing_request_doc(
                "9876543210",
            )]))),
        },
        &mut model,
    );

    // steps 1-3 are never shown, no new record is created
    assert_eq!(model.screen, Screen::Dashboard);
    assert_eq!(model.prefs.current_user.as_deref(), Some("9876543210"));
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::EXISTING_REQUEST_FOUND)
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
fn test_profile_prefills_identity_but_not_help_fields() {
    let (app, mut model) = wizard_ready();

    set_field(&app, &mut model, WizardField::MobileNumber, "9876543210");
    app.update(Event::WizardNextRequested, &mut model);
    app.update(
        Event::DuplicateCheckCompleted {
            result: Box::new(Ok(StoreOutput::Documents(vec![]))),
        },
        &mut model,
    );

    let mut f = Fields::new();
    f.insert(fields::MOBILE_NUMBER.into(), "9876543210".into());
    f.insert(fields::FIRST_NAME.into(), "Asha".into());
    f.insert(fields::LAST_NAME.into(), "Rao".into());
    f.insert(fields::GENDER.into(), "female".into());
    f.insert(fields::LOCATION.into(), "Pune".into());
    app.update(
        Event::ProfileLookupCompleted {
            result: Box::new(Ok(StoreOutput::Document(Some(Document::new(
                "9876543210",
                f,
            ))))),
        },
        &mut model,
    );

    let wizard = model.wizard.as_ref().unwrap();
    assert_eq!(wizard.step, WizardStep::PersonalDetails);
    assert_eq!(wizard.form.first_name, "Asha");
    assert_eq!(wizard.form.last_name, "Rao");
    assert_eq!(wizard.form.gender, "female");
    assert_eq!(wizard.form.location, "Pune");
    assert_eq!(wizard.form.category, "");
    assert_eq!(wizard.form.problem_description, "");
}

#[test]
fn test_duplicate_check_failure_stays_on_first_step() {
    let (app, mut model) = wizard_ready();

    set_field(&app, &mut model, WizardField::MobileNumber, "9876543210");
    app.update(Event::WizardNextRequested, &mut model);
    app.update(
        Event::DuplicateCheckCompleted {
            result: Box::new(Err(StoreError::network("unreachable"))),
        },
        &mut model,
    );

    let wizard = model.wizard.as_ref().unwrap();
    assert_eq!(wizard.step, WizardStep::Mobile);
    assert!(!wizard.is_checking);
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::CHECK_MOBILE_FAILED)
    );
}

#[test]
fn test_submit_failure_keeps_wizard_state() {
    let (app, mut model) = wizard_ready();

    set_field(&app, &mut model, WizardField::MobileNumber, "9876543210");
    app.update(Event::WizardNextRequested, &mut model);
    app.update(
        Event::DuplicateCheckCompleted {
            result: Box::new(Ok(StoreOutput::Documents(vec![]))),
        },
        &mut model,
    );
    app.update(
        Event::ProfileLookupCompleted {
            result: Box::new(Ok(StoreOutput::Document(None))),
        },
        &mut model,
    );
    set_field(&app, &mut model, WizardField::FirstName, "Asha");
    set_field(&app, &mut model, WizardField::LastName, "Rao");
    set_field(&app, &mut model, WizardField::Gender, "female");
    app.update(Event::WizardNextRequested, &mut model);
    set_field(&app, &mut model, WizardField::Location, "Pune");
    app.update(Event::WizardNextRequested, &mut model);
    set_field(&app, &mut model, WizardField::Category, "Medical");
    set_field(
        &app,
        &mut model,
        WizardField::ProblemDescription,
        "Need a checkup",
    );
    app.update(Event::WizardNextRequested, &mut model);

    app.update(
        Event::WizardSubmitCompleted {
            result: Box::new(Err(StoreError::Timeout)),
        },
        &mut model,
    );

    // still on the last step with everything typed in
    assert_eq!(model.screen, Screen::RequestWizard);
    let wizard = model.wizard.as_ref().unwrap();
    assert_eq!(wizard.step, WizardStep::HelpNeeded);
    assert!(!wizard.is_submitting);
    assert_eq!(wizard.form.problem_description, "Need a checkup");
    assert_eq!(
        model.active_toast.as_ref().map(|t| t.message.as_str()),
        Some(messages::SUBMIT_FAILED)
    );
    assert!(model.prefs.current_user.is_none());
}

#[test]
fn test_commit_key_walks_fields_then_advances() {
    let (app, mut model) = wizard_ready();

    set_field(&app, &mut model, WizardField::MobileNumber, "9876543210");
    app.update(Event::WizardNextRequested, &mut model);
    app.update(
        Event::DuplicateCheckCompleted {
            result: Box::new(Ok(StoreOutput::Documents(vec![]))),
        },
        &mut model,
    );
    app.update(
        Event::ProfileLookupCompleted {
            result: Box::new(Ok(StoreOutput::Document(None))),
        },
        &mut model,
    );

    set_field(&app, &mut model, WizardField::FirstName, "Asha");
    app.update(
        Event::WizardCommitKey {
            field: WizardField::FirstName,
        },
        &mut model,
    );
    assert_eq!(
        model.wizard.as_ref().unwrap().focus,
        Some(WizardField::MiddleName)
    );

    set_field(&app, &mut model, WizardField::LastName, "Rao");
    set_field(&app, &mut model, WizardField::Gender, "female");
    // commit on the step's last field advances the step
    app.update(
        Event::WizardCommitKey {
            field: WizardField::Gender,
        },
        &mut model,
    );
    assert_eq!(model.wizard.as_ref().unwrap().step, WizardStep::ContactInfo);
    assert_eq!(
        model.wizard.as_ref().unwrap().focus,
        Some(WizardField::Location)
    );
}

#[test]
fn test_fragment_back_navigation_moves_one_step() {
    let (app, mut model) = wizard_ready();

    set_field(&app, &mut model, WizardField::MobileNumber, "9876543210");
    app.update(Event::WizardNextRequested, &mut model);
    app.update(
        Event::DuplicateCheckCompleted {
            result: Box::new(Ok(StoreOutput::Documents(vec![]))),
        },
        &mut model,
    );
    app.update(
        Event::ProfileLookupCompleted {
            result: Box::new(Ok(StoreOutput::Document(None))),
        },
        &mut model,
    );
    assert_eq!(
        model.wizard.as_ref().unwrap().step,
        WizardStep::PersonalDetails
    );

    // native back surfaces as a fragment change
    app.update(
        Event::UrlChanged {
            url: "/request#mobile".to_string(),
        },
        &mut model,
    );
    assert_eq!(model.wizard.as_ref().unwrap().step, WizardStep::Mobile);

    // the typed identifier survives back-navigation
    assert_eq!(
        model.wizard.as_ref().unwrap().form.mobile_number,
        "9876543210"
    );
}

#[test]
fn test_wizard_submission_carries_pending_status() {
    // the created document is Pending with the identifier as owner
    let (app, mut model) = wizard_ready();

    set_field(&app, &mut model, WizardField::MobileNumber, "9876543210");
    app.update(Event::WizardNextRequested, &mut model);
    app.update(
        Event::DuplicateCheckCompleted {
            result: Box::new(Ok(StoreOutput::Documents(vec![]))),
        },
        &mut model,
    );
    app.update(
        Event::ProfileLookupCompleted {
            result: Box::new(Ok(StoreOutput::Document(None))),
        },
        &mut model,
    );
    set_field(&app, &mut model, WizardField::FirstName, "Asha");
    set_field(&app, &mut model, WizardField::LastName, "Rao");
    set_field(&app, &mut model, WizardField::Gender, "female");
    app.update(Event::WizardNextRequested, &mut model);
    set_field(&app, &mut model, WizardField::Location, "Pune");
    app.update(Event::WizardNextRequested, &mut model);
    set_field(&app, &mut model, WizardField::Category, "Medical");
    set_field(
        &app,
        &mut model,
        WizardField::ProblemDescription,
        "Need a checkup",
    );
    let update = app.update(Event::WizardNextRequested, &mut model);

    let fields_sent = update
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::Store(request) => match &request.operation {
                StoreOperation::Create { collection, fields }
                    if collection == usbs_core::capabilities::REQUESTS_COLLECTION =>
                {
                    Some(fields.clone())
                }
                _ => None,
            },
            _ => None,
        })
        .expect("a create operation was issued");

    assert_eq!(
        fields_sent.get(fields::USER_ID).and_then(|v| v.as_str()),
        Some("9876543210")
    );
    assert_eq!(
        fields_sent.get(fields::STATUS).and_then(|v| v.as_str()),
        Some(RequestStatus::Pending.as_str())
    );
    assert!(fields_sent.contains_key(fields::SUBMITTED_AT));
}
