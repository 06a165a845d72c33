//! Interactive confirmation backed by dialoguer

use conduit_components::{Component, DiscoveredCandidate, Prompt};
use dialoguer::Confirm;
use indicatif::ProgressBar;

/// Asks on the terminal, hiding the active spinner while the question is shown
pub struct DialoguerPrompt {
    spinner: ProgressBar,
}

impl DialoguerPrompt {
    pub fn new(spinner: ProgressBar) -> Self {
        Self { spinner }
    }

    fn ask(&self, question: String) -> bool {
        self.spinner.suspend(|| {
            Confirm::new()
                .with_prompt(question)
                .default(false)
                .interact()
                .unwrap_or(false)
        })
    }
}

impl Prompt for DialoguerPrompt {
    fn confirm_install(&self, candidate: &DiscoveredCandidate) -> bool {
        self.ask(format!(
            "Install {} ({})?",
            candidate.name, candidate.full_name
        ))
    }

    fn confirm_uninstall(&self, component: &Component) -> bool {
        self.ask(format!(
            "Uninstall {} ({})?",
            component.name, component.package
        ))
    }
}
