//! Lifecycle of one scenario's editor session.
//!
//! `New -> Saving -> Persisted -> {Editing <-> Persisted} -> Analyzing -> ResultsReady`
//!
//! While a save or analysis is in flight the session is busy and the editor
//! disables the controls that would start another one.

use crate::error::AnalysisStep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorPhase {
	New,
	Saving,
	Persisted,
	Editing,
	Analyzing,
	ResultsReady,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSession {
	phase: EditorPhase,
	error: Option<String>,
	persisted: bool,
}

impl EditorSession {
	pub fn new(persisted: bool) -> Self {
		Self {
			phase: if persisted {
				EditorPhase::Persisted
			} else {
				EditorPhase::New
			},
			error: None,
			persisted,
		}
	}

	pub fn phase(&self) -> EditorPhase {
		self.phase
	}

	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	pub fn clear_error(&mut self) {
		self.error = None;
	}

	/// Shows an error that did not come from a save or analysis.
	pub fn annotate(&mut self, message: impl Into<String>) {
		self.error = Some(message.into());
	}

	pub fn is_busy(&self) -> bool {
		matches!(self.phase, EditorPhase::Saving | EditorPhase::Analyzing)
	}

	/// Whether the backend has assigned the scenario an id.
	pub fn has_id(&self) -> bool {
		self.persisted
	}

	/// A local edit. New scenarios stay `New` until their first save lands.
	pub fn edited(&mut self) {
		if matches!(
			self.phase,
			EditorPhase::Persisted | EditorPhase::ResultsReady
		) {
			self.phase = EditorPhase::Editing;
		}
	}

	/// Returns `false` if another save or analysis is already in flight.
	pub fn begin_save(&mut self) -> bool {
		if self.is_busy() {
			return false;
		}
		self.phase = EditorPhase::Saving;
		self.error = None;
		true
	}

	/// Optimistic: a failed save keeps local state and returns to where it was.
	pub fn finish_save(&mut self, result: Result<(), String>) {
		match result {
			Ok(()) => {
				self.persisted = true;
				self.phase = EditorPhase::Persisted;
			}
			Err(message) => {
				self.phase = if self.persisted {
					EditorPhase::Editing
				} else {
					EditorPhase::New
				};
				self.error = Some(message);
			}
		}
	}

	/// Returns `false` if another save or analysis is already in flight.
	pub fn begin_analysis(&mut self) -> bool {
		if self.is_busy() {
			return false;
		}
		self.phase = if self.persisted {
			EditorPhase::Analyzing
		} else {
			EditorPhase::Saving
		};
		self.error = None;
		true
	}

	/// Progress reported by the analysis run.
	pub fn observe(&mut self, step: AnalysisStep) {
		if step != AnalysisStep::Persisting {
			self.persisted = true;
			self.phase = EditorPhase::Analyzing;
		}
	}

	/// A failed run lands in `Persisted` once the scenario has been saved;
	/// only a run whose initial save failed goes back to `New`.
	pub fn finish_analysis(&mut self, result: Result<(), String>) {
		match result {
			Ok(()) => self.phase = EditorPhase::ResultsReady,
			Err(message) => {
				self.phase = if self.persisted {
					EditorPhase::Persisted
				} else {
					EditorPhase::New
				};
				self.error = Some(message);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_scenario_save_cycle() {
		let mut s = EditorSession::new(false);
		assert_eq!(s.phase(), EditorPhase::New);
		s.edited();
		assert_eq!(s.phase(), EditorPhase::New);

		assert!(s.begin_save());
		assert!(s.is_busy());
		assert!(!s.begin_save());
		s.finish_save(Ok(()));
		assert_eq!(s.phase(), EditorPhase::Persisted);

		s.edited();
		assert_eq!(s.phase(), EditorPhase::Editing);
	}

	#[test]
	fn failed_first_save_stays_new_with_error() {
		let mut s = EditorSession::new(false);
		s.begin_save();
		s.finish_save(Err("offline".into()));
		assert_eq!(s.phase(), EditorPhase::New);
		assert_eq!(s.error(), Some("offline"));
	}

	#[test]
	fn analysis_failure_returns_to_persisted() {
		let mut s = EditorSession::new(true);
		assert!(s.begin_analysis());
		assert_eq!(s.phase(), EditorPhase::Analyzing);
		assert!(!s.begin_save());
		s.observe(AnalysisStep::Running);
		s.finish_analysis(Err("Failed while running the analysis: boom".into()));
		assert_eq!(s.phase(), EditorPhase::Persisted);
		assert!(s.error().is_some());
	}

	#[test]
	fn analysis_from_new_saves_first() {
		let mut s = EditorSession::new(false);
		assert!(s.begin_analysis());
		assert_eq!(s.phase(), EditorPhase::Saving);
		s.observe(AnalysisStep::Persisting);
		assert_eq!(s.phase(), EditorPhase::Saving);
		s.observe(AnalysisStep::Materializing);
		assert_eq!(s.phase(), EditorPhase::Analyzing);
		s.finish_analysis(Err("x".into()));
		assert_eq!(s.phase(), EditorPhase::Persisted);
	}

	#[test]
	fn successful_analysis_then_edit() {
		let mut s = EditorSession::new(true);
		s.begin_analysis();
		s.finish_analysis(Ok(()));
		assert_eq!(s.phase(), EditorPhase::ResultsReady);
		s.edited();
		assert_eq!(s.phase(), EditorPhase::Editing);
	}
}
