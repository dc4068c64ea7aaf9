//! Deterministic evidence scoring. Structured traces are treated as near ground
//! truth; free-text logs are corroborating but noisy, so both their floor and
//! ceiling sit lower. The constants are part of the observable contract and are
//! relied on by downstream reranking.

pub const TRACE_BASE: f32 = 0.8;
pub const TRACE_FAULT_BONUS: f32 = 0.1;
pub const TRACE_ERROR_BONUS: f32 = 0.05;

pub const LOG_BASE: f32 = 0.4;
pub const LOG_ERROR_BONUS: f32 = 0.2;
pub const LOG_EXCEPTION_BONUS: f32 = 0.15;
pub const LOG_ARN_BONUS: f32 = 0.1;

const ERROR_KEYWORDS: &[&str] = &["error", "failed", "failure"];
const EXCEPTION_KEYWORDS: &[&str] = &["exception", "traceback", "panic"];

pub fn trace_confidence(fault: bool, error: bool) -> f32 {
	let mut score = TRACE_BASE;

	if fault {
		score += TRACE_FAULT_BONUS;
	}
	if error {
		score += TRACE_ERROR_BONUS;
	}

	score.min(1.0)
}

pub fn log_confidence(message: &str) -> f32 {
	let lowered = message.to_lowercase();
	let mut score = LOG_BASE;

	if ERROR_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
		score += LOG_ERROR_BONUS;
	}
	if EXCEPTION_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
		score += LOG_EXCEPTION_BONUS;
	}
	if lowered.contains("arn:") {
		score += LOG_ARN_BONUS;
	}

	score.min(1.0)
}
