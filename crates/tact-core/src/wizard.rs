//! Cost-calculator wizard state machine.
//!
//! The wizard is a plain value: every transition is `reduce(state, action)`,
//! which returns the next state and never fails. Step gates live in
//! [`WizardState::check_step`] and are applied by [`advance`], so the machine
//! itself can be driven (and tested) without any UI.

use serde::Serialize;
use thiserror::Error;

use crate::lead::DEFAULT_GOVERNORATE;
use crate::quiz::{Dimensions, KitchenShape, Material};

/// Upper bound on design picks. Extra picks are silently ignored.
pub const MAX_DESIGNS: usize = 3;

/// One screen of the wizard. Discriminants are the 1-based step numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Step {
    Shape = 1,
    Dimensions = 2,
    Designs = 3,
    Material = 4,
    Processing = 5,
    Contact = 6,
}

impl Step {
    pub const FIRST: Step = Step::Shape;
    pub const LAST: Step = Step::Contact;

    #[must_use]
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Maps any integer onto a step, clamping into `1..=6`.
    #[must_use]
    pub fn clamped(n: i64) -> Step {
        match n {
            i64::MIN..=1 => Step::Shape,
            2 => Step::Dimensions,
            3 => Step::Designs,
            4 => Step::Material,
            5 => Step::Processing,
            _ => Step::Contact,
        }
    }

    #[must_use]
    pub fn next(self) -> Step {
        Step::clamped(i64::from(self.number()) + 1)
    }

    #[must_use]
    pub fn prev(self) -> Step {
        Step::clamped(i64::from(self.number()) - 1)
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> u8 {
        step.number()
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Step::Shape => "shape",
            Step::Dimensions => "dimensions",
            Step::Designs => "designs",
            Step::Material => "material",
            Step::Processing => "processing",
            Step::Contact => "contact",
        };
        write!(f, "step {} ({label})", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("{step}: {reason}")]
    Validation { step: Step, reason: String },

    #[error("wizard already submitted; reset before starting over")]
    AlreadySubmitted,
}

/// Everything a visitor has entered so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    step: Step,
    kitchen_shape: Option<KitchenShape>,
    dimensions: Dimensions,
    selected_design_ids: Vec<String>,
    material: Option<Material>,
    contact_phone: String,
    governorate: String,
    submitted: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: Step::FIRST,
            kitchen_shape: None,
            dimensions: Dimensions::default(),
            selected_design_ids: Vec::new(),
            material: None,
            contact_phone: String::new(),
            governorate: DEFAULT_GOVERNORATE.to_string(),
            submitted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    Next,
    Prev,
    SetStep(i64),
    SetShape(KitchenShape),
    SetDimensions(Dimensions),
    SetWall { index: usize, meters: Option<f64> },
    ToggleDesign(String),
    SetMaterial(Material),
    SetPhone(String),
    SetGovernorate(String),
    MarkSubmitted,
    Reset,
}

impl WizardState {
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub fn kitchen_shape(&self) -> Option<KitchenShape> {
        self.kitchen_shape
    }

    #[must_use]
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    #[must_use]
    pub fn selected_design_ids(&self) -> &[String] {
        &self.selected_design_ids
    }

    #[must_use]
    pub fn material(&self) -> Option<Material> {
        self.material
    }

    #[must_use]
    pub fn contact_phone(&self) -> &str {
        &self.contact_phone
    }

    #[must_use]
    pub fn governorate(&self) -> &str {
        &self.governorate
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Applies the gate that guards leaving `step`.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Validation`] naming `step` when its input is
    /// missing or out of bounds.
    pub fn check_step(&self, step: Step) -> Result<(), WizardError> {
        let fail = |reason: &str| {
            Err(WizardError::Validation {
                step,
                reason: reason.to_string(),
            })
        };

        match step {
            Step::Shape if self.kitchen_shape.is_none() => fail("choose a kitchen shape"),
            Step::Dimensions => match self.kitchen_shape {
                None => fail("choose a kitchen shape before entering dimensions"),
                Some(shape) if !self.dimensions.is_filled_for(shape) => fail(&format!(
                    "{shape} kitchen needs {} positive wall length(s)",
                    shape.required_walls()
                )),
                Some(_) => Ok(()),
            },
            Step::Designs
                if self.selected_design_ids.is_empty()
                    || self.selected_design_ids.len() > MAX_DESIGNS =>
            {
                fail("pick between 1 and 3 designs")
            }
            Step::Material if self.material.is_none() => fail("choose a material"),
            _ => Ok(()),
        }
    }

    /// True when every input gate (steps 1 through 4) passes.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_incomplete_step().is_none()
    }

    /// The earliest input step whose gate fails, with the reason.
    #[must_use]
    pub fn first_incomplete_step(&self) -> Option<WizardError> {
        [Step::Shape, Step::Dimensions, Step::Designs, Step::Material]
            .into_iter()
            .find_map(|step| self.check_step(step).err())
    }
}

/// Pure transition function.
///
/// Once the wizard is submitted every action except [`WizardAction::Reset`]
/// leaves the state untouched.
#[must_use]
pub fn reduce(mut state: WizardState, action: WizardAction) -> WizardState {
    if state.submitted && action != WizardAction::Reset {
        return state;
    }

    match action {
        WizardAction::Next => state.step = state.step.next(),
        WizardAction::Prev => state.step = state.step.prev(),
        WizardAction::SetStep(n) => state.step = Step::clamped(n),
        WizardAction::SetShape(shape) => state.kitchen_shape = Some(shape),
        WizardAction::SetDimensions(dimensions) => state.dimensions = dimensions,
        WizardAction::SetWall { index, meters } => state.dimensions.set_wall(index, meters),
        WizardAction::ToggleDesign(id) => {
            if let Some(pos) = state.selected_design_ids.iter().position(|d| *d == id) {
                state.selected_design_ids.remove(pos);
            } else if state.selected_design_ids.len() < MAX_DESIGNS {
                state.selected_design_ids.push(id);
            }
        }
        WizardAction::SetMaterial(material) => state.material = Some(material),
        WizardAction::SetPhone(phone) => state.contact_phone = phone,
        WizardAction::SetGovernorate(governorate) => state.governorate = governorate,
        WizardAction::MarkSubmitted => state.submitted = true,
        WizardAction::Reset => state = WizardState::default(),
    }

    state
}

/// Moves forward one step if the current step's gate passes.
///
/// # Errors
///
/// Returns [`WizardError::Validation`] when the current step is incomplete,
/// or [`WizardError::AlreadySubmitted`] after submission.
pub fn advance(state: WizardState) -> Result<WizardState, WizardError> {
    if state.submitted {
        return Err(WizardError::AlreadySubmitted);
    }
    state.check_step(state.step)?;
    Ok(reduce(state, WizardAction::Next))
}

#[cfg(test)]
#[path = "wizard_test.rs"]
mod tests;
