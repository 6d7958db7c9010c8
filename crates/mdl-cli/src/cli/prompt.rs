//! Save-location choosers for the terminal.

use mdl_core::persist::{ChooseError, SaveLocationChooser, SaveRequest, WritableHandle};
use mdl_core::url_model::sanitize_filename;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// `--output PATH`: no question asked. A directory gets the suggested name.
pub struct FixedPathChooser {
    path: PathBuf,
}

impl FixedPathChooser {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SaveLocationChooser for FixedPathChooser {
    fn choose(&self, request: &SaveRequest) -> Result<WritableHandle, ChooseError> {
        Ok(WritableHandle::new(target_path(&self.path, request)))
    }
}

/// Asks on stderr, reads the answer from stdin.
///
/// Empty answer accepts the suggestion, `q` cancels the whole download.
/// Without a terminal the chooser reports failure, which saves into the
/// download directory instead.
pub struct PromptChooser {
    default_dir: PathBuf,
}

impl PromptChooser {
    pub fn new(default_dir: PathBuf) -> Self {
        Self { default_dir }
    }
}

impl SaveLocationChooser for PromptChooser {
    fn choose(&self, request: &SaveRequest) -> Result<WritableHandle, ChooseError> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Err(ChooseError::Failed("stdin is not a terminal".to_string()));
        }
        let suggested = self.default_dir.join(suggested_name(request));
        eprint!(
            "Save {} as [{}] (q to cancel): ",
            request.description,
            suggested.display()
        );
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match stdin.lock().read_line(&mut answer) {
            Ok(0) => Err(ChooseError::Failed("no answer on stdin".to_string())),
            Ok(_) => interpret_answer(&answer, &self.default_dir, request),
            Err(e) => Err(ChooseError::Failed(e.to_string())),
        }
    }
}

fn suggested_name(request: &SaveRequest) -> String {
    let name = sanitize_filename(&request.suggested_name);
    if name.is_empty() {
        format!("download{}", request.extension)
    } else {
        name
    }
}

/// Existing directory → suggested name inside it; anything else is the file path.
fn target_path(path: &Path, request: &SaveRequest) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_name(request))
    } else {
        path.to_path_buf()
    }
}

fn interpret_answer(
    answer: &str,
    default_dir: &Path,
    request: &SaveRequest,
) -> Result<WritableHandle, ChooseError> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("q") {
        return Err(ChooseError::Cancelled);
    }
    if answer.is_empty() {
        return Ok(WritableHandle::new(default_dir.join(suggested_name(request))));
    }
    Ok(WritableHandle::new(target_path(Path::new(answer), request)))
}
