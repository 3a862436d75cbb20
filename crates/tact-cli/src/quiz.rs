//! Funnel command handlers: the cost-calculator wizard and the contact form.
//!
//! Both run the same submission path the HTTP server uses, reporting on the
//! server channel and on the pixel through its image beacon.

use std::sync::Arc;
use std::time::Duration;

use tact_core::quiz::parse_wall_input;
use tact_core::{
    advance, reduce, run_processing, validate_local_phone, AppConfig, ContactForm, KitchenShape,
    LeadFields, LeadId, Material, ProcessingSequence, WizardAction, WizardState, MAX_DESIGNS,
};
use tact_funnel::{lead_event, pick_design, LeadSubmitter};
use tact_meta::{BeaconTransport, ConversionsClient, PixelEmitter, PixelSink, ServerSink};
use tact_store::RestStore;

pub(crate) const DEFAULT_PAGE_URL: &str = "https://tact-iq.com/cost-calculator";

/// Answers for wizard steps 1 through 4 plus the contact step.
#[derive(Debug, Clone)]
pub(crate) struct QuizInput {
    pub shape: KitchenShape,
    pub walls: Vec<f64>,
    pub designs: Vec<String>,
    pub material: Material,
    pub phone: String,
    pub governorate: Option<String>,
}

/// Clap value parser for `--wall`, accepting what the dimension inputs accept.
pub(crate) fn parse_wall(raw: &str) -> Result<f64, String> {
    parse_wall_input(raw).ok_or_else(|| format!("'{raw}' is not a wall length in meters"))
}

/// Replays the answers through the wizard gates, stopping on the
/// processing step. Design picks go through [`pick_design`] so each one
/// reaches the pixel like a click would.
///
/// # Errors
///
/// Returns an error naming the first step whose gate rejects the answers.
pub(crate) fn walk_to_processing(
    input: &QuizInput,
    pixel: &PixelEmitter,
) -> anyhow::Result<WizardState> {
    if input.designs.len() > MAX_DESIGNS {
        anyhow::bail!(
            "at most {MAX_DESIGNS} designs can be selected, got {}",
            input.designs.len()
        );
    }

    let state = reduce(WizardState::default(), WizardAction::SetShape(input.shape));
    let mut state = advance(state)?;

    for (i, meters) in input.walls.iter().enumerate() {
        state = reduce(
            state,
            WizardAction::SetWall {
                index: i + 1,
                meters: Some(*meters),
            },
        );
    }
    let mut state = advance(state)?;

    for id in &input.designs {
        state = pick_design(state, id, None, pixel);
    }
    let state = advance(state)?;

    let state = reduce(state, WizardAction::SetMaterial(input.material));
    Ok(advance(state)?)
}

/// Applies the contact-step answers.
pub(crate) fn fill_contact(mut state: WizardState, input: &QuizInput) -> WizardState {
    if let Some(governorate) = &input.governorate {
        state = reduce(state, WizardAction::SetGovernorate(governorate.clone()));
    }
    reduce(state, WizardAction::SetPhone(input.phone.clone()))
}

fn processing_sequence(fast: bool) -> ProcessingSequence {
    if fast {
        ProcessingSequence {
            interval: Duration::ZERO,
            settle: Duration::ZERO,
            ..ProcessingSequence::default()
        }
    } else {
        ProcessingSequence::default()
    }
}

/// One emitter per process, loaded against `page_url`. Without a pixel id
/// (or on a dry run) it stays unavailable and every emit is a no-op.
fn load_pixel(
    config: &AppConfig,
    page_url: &str,
    dry_run: bool,
) -> anyhow::Result<Arc<PixelEmitter>> {
    let pixel_id = if dry_run {
        None
    } else {
        config.meta.pixel_id.clone()
    };
    let transport = BeaconTransport::new()
        .map_err(|e| anyhow::anyhow!("failed to build pixel transport: {e}"))?;
    let pixel = Arc::new(PixelEmitter::new(pixel_id, Arc::new(transport)));
    pixel.init(page_url);
    Ok(pixel)
}

fn submitter(config: &AppConfig, pixel: Arc<PixelEmitter>) -> anyhow::Result<LeadSubmitter> {
    let store = RestStore::new(&config.store)
        .map_err(|e| anyhow::anyhow!("failed to build store client: {e}"))?;
    let conversions = ConversionsClient::new(&config.meta)
        .map_err(|e| anyhow::anyhow!("failed to build conversions client: {e}"))?;
    if !conversions.is_configured() {
        tracing::warn!(
            "META_PIXEL_ID or META_ACCESS_TOKEN unset; conversion events will be skipped"
        );
    }
    Ok(LeadSubmitter::new(Arc::new(store))
        .with_sink(Arc::new(PixelSink::new(pixel)))
        .with_sink(Arc::new(ServerSink::new(Arc::new(conversions)))))
}

/// Walk the wizard, play the calculating interstitial, and submit the lead.
///
/// With `dry_run` the lead row and the hashed conversion payload are printed
/// and nothing leaves the process.
///
/// # Errors
///
/// Returns an error if a wizard gate rejects the answers, the phone is not a
/// local mobile number, or the store rejects the lead. Conversion failures
/// are logged, not propagated.
pub(crate) async fn run_quiz(
    config: &AppConfig,
    input: QuizInput,
    page_url: &str,
    fast: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let pixel = load_pixel(config, page_url, dry_run)?;
    let state = walk_to_processing(&input, &pixel)?;

    println!("{}", state.step());
    let state = run_processing(state, &processing_sequence(fast), |status| {
        println!("  {status}");
    })
    .await;
    let state = fill_contact(state, &input);

    if dry_run {
        if validate_local_phone(state.contact_phone()).is_none() {
            anyhow::bail!("phone must be a local mobile number (07XXXXXXXXX)");
        }
        let fields = LeadFields::from_wizard(&state);
        let conversions = ConversionsClient::new(&config.meta)
            .map_err(|e| anyhow::anyhow!("failed to build conversions client: {e}"))?;
        let event = lead_event(&fields, &LeadId("dry-run".to_owned()), page_url);
        let payload = conversions.build_payload(&event, chrono::Utc::now().timestamp());

        println!("dry-run: lead row");
        println!("{}", serde_json::to_string_pretty(&fields)?);
        println!("dry-run: conversion payload");
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let submitter = submitter(config, pixel)?;
    let lead_id = submitter.submit(&state, page_url).await?;
    println!("lead stored: {lead_id}");

    submitter.flush().await;
    Ok(())
}

/// Store a contact-form message and report it as a `Contact` conversion.
///
/// # Errors
///
/// Returns an error if the name or phone is blank or the store rejects the
/// message.
pub(crate) async fn run_contact(
    config: &AppConfig,
    form: ContactForm,
    page_url: &str,
) -> anyhow::Result<()> {
    let submitter = submitter(config, load_pixel(config, page_url, false)?)?;
    let lead_id = submitter.submit_contact(form, page_url).await?;
    println!("contact request stored: {lead_id}");

    submitter.flush().await;
    Ok(())
}
