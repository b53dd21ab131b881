//! Interactive multi-select prompts

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::MultiSelect;

/// Visible rows of a prompt
pub const PAGE_SIZE: usize = 10;

/// Answer to a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen(Vec<String>),
    /// The user aborted (Esc, q or Ctrl+C)
    Interrupted,
}

/// Asks the user to pick a subset of options
pub trait Selector {
    fn select(&mut self, message: &str, options: &[String], preselected: &[String])
        -> Result<Selection>;
}

/// Prompts on the terminal
#[derive(Default)]
pub struct TerminalSelector {
    theme: ColorfulTheme,
}

impl TerminalSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Selector for TerminalSelector {
    fn select(
        &mut self,
        message: &str,
        options: &[String],
        preselected: &[String],
    ) -> Result<Selection> {
        let defaults: Vec<bool> = options.iter().map(|o| preselected.contains(o)).collect();

        let answer = off_runtime(|| {
            MultiSelect::with_theme(&self.theme)
                .with_prompt(message)
                .items(options)
                .defaults(&defaults)
                .max_length(PAGE_SIZE)
                .interact_opt()
        });

        match answer {
            Ok(Some(indices)) => Ok(Selection::Chosen(
                indices.into_iter().map(|i| options[i].clone()).collect(),
            )),
            Ok(None) => Ok(Selection::Interrupted),
            Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
                Ok(Selection::Interrupted)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Run a blocking call without stalling tasks on the current runtime
///
/// On a multi-threaded runtime the worker hands its tasks to another thread
/// for the duration of `f`.
pub fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    use tokio::runtime::{Handle, RuntimeFlavor};

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Options preselected for a prompt: the only option, if there is just one
pub fn preselect(options: &[String]) -> Vec<String> {
    if options.len() == 1 {
        options.to_vec()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preselect_single_option() {
        assert_eq!(preselect(&["Kyverno".to_string()]), vec!["Kyverno"]);
        assert!(preselect(&["a".to_string(), "b".to_string()]).is_empty());
        assert!(preselect(&[]).is_empty());
    }

    #[test]
    fn test_off_runtime_without_runtime() {
        assert_eq!(off_runtime(|| 7), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_off_runtime_keeps_other_tasks_running() {
        let (tx, rx) = std::sync::mpsc::channel();

        let waiting = tokio::spawn(async move {
            off_runtime(|| rx.recv_timeout(std::time::Duration::from_secs(5)))
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        tokio::spawn(async move { tx.send("tick").unwrap() });

        assert_eq!(waiting.await.unwrap(), Ok("tick"));
    }
}
