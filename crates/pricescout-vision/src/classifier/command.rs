//! Classifier backed by a local model runner command.
//!
//! The command is invoked as `<cmd> [args...] --image <input.png>` with the
//! photo already resized to the model input size, and must print JSON on
//! stdout, either
//!
//! ```text
//! {"label": "cellular telephone", "confidence": 0.91}
//! ```
//!
//! or a ranked list, top prediction first:
//!
//! ```text
//! {"predictions": [{"className": "notebook, notebook computer", "probability": 0.72}]}
//! ```

use super::response::extract_json_from_response;
use super::Classifier;
use crate::preprocess::{cleanup_model_input, write_model_input, MODEL_INPUT_SIZE};
use pricescout_types::{Classification, Error, Result, UNKNOWN_LABEL};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(alias = "className", alias = "class_name")]
    label: String,
    #[serde(default, alias = "probability", alias = "score")]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ClassifierOutput {
    #[serde(default)]
    predictions: Vec<Prediction>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse model runner stdout into the top classification.
///
/// A missing or blank label becomes "Unknown".
pub fn parse_classifier_output(stdout: &str) -> Result<Classification> {
    let json_str = extract_json_from_response(stdout);
    let output: ClassifierOutput = serde_json::from_str(&json_str).map_err(|e| {
        Error::ClassificationFailed(format!("invalid classifier output: {} - response: {}", e, json_str))
    })?;

    if let Some(error) = output.error {
        return Err(Error::ClassificationFailed(error));
    }

    let (label, confidence) = match output.predictions.into_iter().next() {
        Some(top) => (Some(top.label), top.confidence),
        None => (output.label, output.confidence),
    };

    match label {
        Some(label) if !label.trim().is_empty() => Ok(Classification::new(label.trim(), confidence)),
        _ => Ok(Classification::new(UNKNOWN_LABEL, confidence)),
    }
}

/// Runs an external model runner for every image
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    program: String,
    args: Vec<String>,
    /// Normalized command line, also the cache scope
    command_line: String,
    input_size: u32,
}

impl CommandClassifier {
    /// Build from a shell-style command line, e.g. `python3 classify.py --model mobilenet.tflite`
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = shell_words::split(command_line).map_err(|e| {
            Error::ClassifierUnavailable(format!("invalid classifier command '{}': {}", command_line, e))
        })?;

        if parts.is_empty() {
            return Err(Error::ClassifierUnavailable(
                "classifier command is empty".to_string(),
            ));
        }

        let command_line = shell_words::join(&parts);
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
            command_line,
            input_size: MODEL_INPUT_SIZE,
        })
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size.max(1);
        self
    }

    fn run(&self, input_path: &Path) -> Result<Classification> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.arg("--image");
        cmd.arg(input_path);

        debug!(program = %self.program, args = ?self.args, input = %input_path.display(), "running classifier");

        let output = cmd.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ClassifierUnavailable(format!(
                "classifier program not found: {}",
                self.program
            )),
            _ => Error::ClassificationFailed(format!("failed to run {}: {}", self.program, e)),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ClassificationFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(Error::ClassificationFailed(
                "classifier produced no output".to_string(),
            ));
        }

        parse_classifier_output(stdout.as_ref())
    }
}

impl Classifier for CommandClassifier {
    fn name(&self) -> &str {
        &self.command_line
    }

    fn classify(&self, image_path: &Path) -> Result<Classification> {
        let input_path = write_model_input(image_path, self.input_size)?;
        let result = self.run(&input_path);
        cleanup_model_input(&input_path);

        let classification = result?;
        debug!(label = %classification.label, confidence = ?classification.confidence, "classified");
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_label() {
        let c = parse_classifier_output(r#"{"label": "cellular telephone", "confidence": 0.91}"#).unwrap();
        assert_eq!(c.label, "cellular telephone");
        assert_eq!(c.confidence, Some(0.91));
    }

    #[test]
    fn test_parse_predictions_takes_first() {
        let stdout = r#"{"predictions": [
            {"className": "notebook, notebook computer", "probability": 0.72},
            {"className": "laptop, laptop computer", "probability": 0.20}
        ]}"#;
        let c = parse_classifier_output(stdout).unwrap();
        assert_eq!(c.label, "notebook, notebook computer");
        assert_eq!(c.confidence, Some(0.72));
    }

    #[test]
    fn test_parse_empty_predictions_is_unknown() {
        let c = parse_classifier_output(r#"{"predictions": []}"#).unwrap();
        assert!(c.is_unknown());

        let c = parse_classifier_output(r#"{"label": "   "}"#).unwrap();
        assert!(c.is_unknown());
    }

    #[test]
    fn test_parse_reported_error() {
        let err = parse_classifier_output(r#"{"error": "model not loaded"}"#).unwrap_err();
        assert!(matches!(err, Error::ClassificationFailed(ref msg) if msg == "model not loaded"));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_classifier_output("segfault").is_err());
    }

    #[test]
    fn test_from_command_line_splits_args() {
        let classifier = CommandClassifier::from_command_line("python3 'my models/classify.py' --top 1").unwrap();
        assert_eq!(classifier.program, "python3");
        assert_eq!(classifier.args, vec!["my models/classify.py", "--top", "1"]);
        assert_eq!(classifier.name(), "python3 'my models/classify.py' --top 1");
    }

    #[test]
    fn test_from_command_line_rejects_empty() {
        assert!(matches!(
            CommandClassifier::from_command_line("   "),
            Err(Error::ClassifierUnavailable(_))
        ));
        assert!(CommandClassifier::from_command_line("python3 'unterminated").is_err());
    }

    #[test]
    fn test_name_covers_full_command_line() {
        let mobilenet = CommandClassifier::from_command_line("python3 classify.py --model mobilenet.tflite").unwrap();
        let resnet = CommandClassifier::from_command_line("python3  classify.py --model resnet.tflite").unwrap();
        assert_eq!(mobilenet.name(), "python3 classify.py --model mobilenet.tflite");
        assert_ne!(mobilenet.name(), resnet.name());

        // quoting is normalized, so equivalent command lines share a name
        let quoted = CommandClassifier::from_command_line("'python3' classify.py --model 'mobilenet.tflite'").unwrap();
        assert_eq!(quoted.name(), mobilenet.name());
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use image::{Rgb, RgbImage};
        use std::path::PathBuf;
        use tempfile::tempdir;

        fn sample_image(dir: &Path) -> PathBuf {
            let path = dir.join("phone.jpg");
            RgbImage::from_pixel(300, 200, Rgb([10, 10, 10])).save(&path).unwrap();
            path
        }

        #[test]
        fn test_classify_with_echo() {
            let dir = tempdir().unwrap();
            let classifier = CommandClassifier::from_command_line(
                r#"echo '{"label": "cellular telephone", "confidence": 0.91}'"#,
            )
            .unwrap();

            let c = classifier.classify(&sample_image(dir.path())).unwrap();
            assert_eq!(c.label, "cellular telephone");
        }

        #[test]
        fn test_classify_nonzero_exit() {
            let dir = tempdir().unwrap();
            let classifier = CommandClassifier::from_command_line("false").unwrap();
            let err = classifier.classify(&sample_image(dir.path())).unwrap_err();
            assert!(matches!(err, Error::ClassificationFailed(_)));
        }

        #[test]
        fn test_classify_missing_program() {
            let dir = tempdir().unwrap();
            let classifier =
                CommandClassifier::from_command_line("pricescout-no-such-model-runner").unwrap();
            let err = classifier.classify(&sample_image(dir.path())).unwrap_err();
            assert!(matches!(err, Error::ClassifierUnavailable(_)));
        }
    }
}
