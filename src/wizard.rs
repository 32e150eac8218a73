use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::PATH_REQUEST;

pub const WIZARD_STEP_COUNT: usize = 4;
pub const MOBILE_NUMBER_LEN: usize = 10;

/// The four ordered steps of the request form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Mobile,
    PersonalDetails,
    ContactInfo,
    HelpNeeded,
}

impl WizardStep {
    pub const ALL: [Self; WIZARD_STEP_COUNT] = [
        Self::Mobile,
        Self::PersonalDetails,
        Self::ContactInfo,
        Self::HelpNeeded,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Mobile => 0,
            Self::PersonalDetails => 1,
            Self::ContactInfo => 2,
            Self::HelpNeeded => 3,
        }
    }

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::PersonalDetails => "personal-details",
            Self::ContactInfo => "contact-info",
            Self::HelpNeeded => "help-needed",
        }
    }

    /// Unknown slugs snap to the first step.
    #[must_use]
    pub fn from_slug(slug: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|step| step.slug() == slug)
            .unwrap_or(Self::Mobile)
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Mobile => Some(Self::PersonalDetails),
            Self::PersonalDetails => Some(Self::ContactInfo),
            Self::ContactInfo => Some(Self::HelpNeeded),
            Self::HelpNeeded => None,
        }
    }

    #[must_use]
    pub const fn is_last(self) -> bool {
        matches!(self, Self::HelpNeeded)
    }

    #[must_use]
    pub fn url(self) -> String {
        format!("{PATH_REQUEST}#{}", self.slug())
    }
}

/// Every input of the form, in no particular order; per-step order comes
/// from [`step_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardField {
    MobileNumber,
    FirstName,
    MiddleName,
    LastName,
    Gender,
    Location,
    Category,
    ProblemDescription,
}

/// The fixed focus order within each step.
#[must_use]
pub const fn step_fields(step: WizardStep) -> &'static [WizardField] {
    match step {
        WizardStep::Mobile => &[WizardField::MobileNumber],
        WizardStep::PersonalDetails => &[
            WizardField::FirstName,
            WizardField::MiddleName,
            WizardField::LastName,
            WizardField::Gender,
        ],
        WizardStep::ContactInfo => &[WizardField::Location],
        WizardStep::HelpNeeded => &[WizardField::Category, WizardField::ProblemDescription],
    }
}

#[must_use]
pub fn first_field(step: WizardStep) -> WizardField {
    step_fields(step)[0]
}

/// The field the commit key moves focus to, or `None` on the step's last
/// field (which advances/submits instead).
#[must_use]
pub fn next_field(step: WizardStep, field: WizardField) -> Option<WizardField> {
    let fields = step_fields(step);
    fields
        .iter()
        .position(|f| *f == field)
        .and_then(|i| fields.get(i + 1))
        .copied()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MobileNumberError {
    #[error("mobile number must be exactly {MOBILE_NUMBER_LEN} digits")]
    WrongLength,
    #[error("mobile number may only contain digits")]
    NonDigit,
}

/// A 10-digit subscriber number. Leading zeros are significant, so this is
/// a string, never an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MobileNumber(String);

impl MobileNumber {
    pub fn parse(input: &str) -> Result<Self, MobileNumberError> {
        if !input.chars().all(|c| c.is_ascii_digit()) {
            return Err(MobileNumberError::NonDigit);
        }
        if input.len() != MOBILE_NUMBER_LEN {
            return Err(MobileNumberError::WrongLength);
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardForm {
    pub mobile_number: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub gender: String,
    pub location: String,
    pub category: String,
    pub problem_description: String,
}

impl WizardForm {
    /// Apply a single field edit. The mobile number is digit-filtered and
    /// clamped to length as typed, mirroring the input mask.
    pub fn set(&mut self, field: WizardField, value: &str) {
        match field {
            WizardField::MobileNumber => {
                self.mobile_number = value
                    .chars()
                    .filter(char::is_ascii_digit)
                    .take(MOBILE_NUMBER_LEN)
                    .collect();
            }
            WizardField::FirstName => self.first_name = value.to_string(),
            WizardField::MiddleName => self.middle_name = value.to_string(),
            WizardField::LastName => self.last_name = value.to_string(),
            WizardField::Gender => self.gender = value.to_string(),
            WizardField::Location => self.location = value.to_string(),
            WizardField::Category => self.category = value.to_string(),
            WizardField::ProblemDescription => self.problem_description = value.to_string(),
        }
    }

    #[must_use]
    pub fn get(&self, field: WizardField) -> &str {
        match field {
            WizardField::MobileNumber => &self.mobile_number,
            WizardField::FirstName => &self.first_name,
            WizardField::MiddleName => &self.middle_name,
            WizardField::LastName => &self.last_name,
            WizardField::Gender => &self.gender,
            WizardField::Location => &self.location,
            WizardField::Category => &self.category,
            WizardField::ProblemDescription => &self.problem_description,
        }
    }

    #[must_use]
    pub fn step_valid(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::Mobile => MobileNumber::parse(&self.mobile_number).is_ok(),
            WizardStep::PersonalDetails => {
                !self.first_name.is_empty()
                    && !self.last_name.is_empty()
                    && !self.gender.is_empty()
            }
            WizardStep::ContactInfo => !self.location.is_empty(),
            WizardStep::HelpNeeded => {
                !self.category.is_empty() && !self.problem_description.is_empty()
            }
        }
    }
}

/// Session-scoped wizard state; destroyed on navigation away or on
/// successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub form: WizardForm,
    pub focus: Option<WizardField>,
    pub is_checking: bool,
    pub is_submitting: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: WizardStep::Mobile,
            form: WizardForm::default(),
            focus: Some(first_field(WizardStep::Mobile)),
            is_checking: false,
            is_submitting: false,
        }
    }

    /// Move to a step and focus its first input.
    pub fn enter_step(&mut self, step: WizardStep) {
        self.step = step;
        self.focus = Some(first_field(step));
    }

    /// Resynchronize from a URL fragment (covers native back/forward).
    pub fn sync_from_fragment(&mut self, fragment: Option<&str>) {
        let step = fragment.map_or(WizardStep::Mobile, WizardStep::from_slug);
        if step != self.step {
            self.enter_step(step);
        }
    }

    #[must_use]
    pub fn current_step_valid(&self) -> bool {
        self.form.step_valid(self.step)
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.is_checking || self.is_submitting
    }
}
