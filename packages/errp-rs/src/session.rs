use crate::config::{validate_session, validate_subjects, PreprocessConfig};
use crate::epochs::preprocess_file;
use crate::error::{ErrpError, Result};
use crate::fetch::local_path;
use crate::types::EpochSet;
use log::info;
use std::path::Path;

/// Preprocess one session of several subjects into a single epoch set.
///
/// Subjects are concatenated in the order given; a missing or unreadable
/// file aborts the whole call.
pub fn load_session(
    data_dir: &Path,
    session: u32,
    subjects: &[u32],
    config: &PreprocessConfig,
) -> Result<EpochSet> {
    validate_subjects(subjects)?;
    validate_session(session)?;
    config.validate()?;

    let mut sets = Vec::with_capacity(subjects.len());
    for &subject in subjects {
        let path = local_path(data_dir, subject, session);
        if !path.exists() {
            return Err(ErrpError::FileNotFound(format!(
                "{} (subject {}, session {})",
                path.display(),
                subject,
                session
            )));
        }
        let mut epochs = preprocess_file(&path, config)?;
        // The file name is authoritative for provenance.
        for event in &mut epochs.events {
            event.subject = Some(subject);
            event.session = Some(session);
        }
        for dropped in &mut epochs.drop_log {
            dropped.subject = Some(subject);
            dropped.session = Some(session);
        }
        sets.push(epochs);
    }

    let combined = EpochSet::concatenate(sets)?;
    info!(
        "Session {}: {} epochs from subjects {:?}",
        session,
        combined.n_epochs(),
        subjects
    );
    Ok(combined)
}
