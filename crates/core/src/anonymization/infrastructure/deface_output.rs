use std::collections::VecDeque;
use std::io::Read;

use crate::anonymization::domain::anonymize_error::FailureKind;

const CORRUPT_SIGNATURES: &[&str] = &[
    "moov atom not found",
    "invalid data found when processing input",
    "could not find codec parameters",
    "could not open file",
];
const DETECTOR_SIGNATURES: &[&str] = &["failed to create detector", "onnxruntime"];
const UNSUPPORTED_SIGNATURES: &[&str] = &["unsupported", "unknown file type", "not a video"];

/// Extracts `(n, total)` from a tqdm status line such as
/// ` 45%|████▌     | 45/100 [00:01<00:01, 30.00it/s]`.
pub fn parse_progress(line: &str) -> Option<(usize, usize)> {
    if !line.contains('|') {
        return None;
    }
    line.split(|c: char| c.is_whitespace() || c == '|')
        .filter_map(|token| token.split_once('/'))
        .find_map(|(done, total)| Some((done.parse().ok()?, total.parse().ok()?)))
}

pub fn classify(lines: &VecDeque<String>) -> FailureKind {
    let matches = |signatures: &[&str]| {
        lines.iter().any(|line| {
            let lower = line.to_lowercase();
            signatures.iter().any(|s| lower.contains(s))
        })
    };

    if matches(CORRUPT_SIGNATURES) {
        FailureKind::CorruptInput
    } else if matches(DETECTOR_SIGNATURES) {
        FailureKind::DetectorUnavailable
    } else if matches(UNSUPPORTED_SIGNATURES) {
        FailureKind::UnsupportedFormat
    } else {
        FailureKind::Other
    }
}

/// Last meaningful diagnostic line (Python puts the exception last).
pub fn summarize(lines: &VecDeque<String>) -> String {
    lines
        .iter()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "no diagnostic output".to_string())
}

/// Consumes a child's stderr, forwarding tqdm progress and keeping the last
/// `capacity` other lines. tqdm redraws with `\r`, so both `\r` and `\n`
/// terminate a line.
pub fn drain(
    mut stream: impl Read,
    capacity: usize,
    on_progress: &dyn Fn(usize, usize),
) -> VecDeque<String> {
    let mut tail = VecDeque::with_capacity(capacity);
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("stderr read ended: {e}");
                break;
            }
        };
        for &byte in &buf[..n] {
            if byte == b'\r' || byte == b'\n' {
                flush_line(&mut pending, &mut tail, capacity, on_progress);
            } else {
                pending.push(byte);
            }
        }
    }
    flush_line(&mut pending, &mut tail, capacity, on_progress);
    tail
}

fn flush_line(
    pending: &mut Vec<u8>,
    tail: &mut VecDeque<String>,
    capacity: usize,
    on_progress: &dyn Fn(usize, usize),
) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending).to_string();
    pending.clear();

    if let Some((done, total)) = parse_progress(&line) {
        on_progress(done, total);
        return;
    }
    log::debug!("deface: {line}");
    if capacity == 0 {
        return;
    }
    if tail.len() == capacity {
        tail.pop_front();
    }
    tail.push_back(line);
}
