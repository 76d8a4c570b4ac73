// Macros file - tracing macros are referenced by full path inside the definitions

/// Standardized logging macros for consistent field names and message patterns across the crate
///
/// These macros ensure:
/// - Consistent field naming conventions
/// - Appropriate logging levels for different scenarios
/// - Structured logging with context

// ============================================================================
// Service Layer Logging Macros
// ============================================================================

/// Log service operation start with context
#[macro_export]
macro_rules! log_service_start {
    ($service:expr, $operation:expr, topic = $topic:expr) => {
        tracing::debug!(
            service = $service,
            operation = $operation,
            topic = %$topic,
            "Service operation started"
        );
    };
    ($service:expr, $operation:expr, topic_count = $count:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            topic_count = $count,
            "Service operation started"
        );
    };
    ($service:expr, $operation:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            "Service operation started"
        );
    };
}

/// Log service operation success
#[macro_export]
macro_rules! log_service_success {
    ($service:expr, $operation:expr, topic = $topic:expr, $msg:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            topic = %$topic,
            "Service operation completed: {}", $msg
        );
    };
    ($service:expr, $operation:expr, question_count = $count:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            question_count = $count,
            duration_ms = $duration,
            "Service operation completed successfully"
        );
    };
    ($service:expr, $operation:expr, $msg:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            "Service operation completed: {}", $msg
        );
    };
}

/// Log service operation errors
#[macro_export]
macro_rules! log_service_error {
    ($service:expr, $operation:expr, topic = $topic:expr, error = $error:expr) => {
        tracing::error!(
            service = $service,
            operation = $operation,
            topic = %$topic,
            error = %$error,
            "Service operation failed"
        );
    };
    ($service:expr, $operation:expr, error = $error:expr) => {
        tracing::error!(
            service = $service,
            operation = $operation,
            error = %$error,
            "Service operation failed"
        );
    };
}

/// Log service warnings
#[macro_export]
macro_rules! log_service_warn {
    ($service:expr, $operation:expr, topic = $topic:expr, $msg:expr) => {
        tracing::warn!(
            service = $service,
            operation = $operation,
            topic = %$topic,
            "Service warning: {}",
            $msg
        );
    };
    ($service:expr, $operation:expr, $msg:expr) => {
        tracing::warn!(
            service = $service,
            operation = $operation,
            "Service warning: {}",
            $msg
        );
    };
}

// ============================================================================
// Remote Call Logging Macros
// ============================================================================

/// Log calls across the quiz service boundary
#[macro_export]
macro_rules! log_remote_call {
    (start, $operation:expr, backend = $backend:expr) => {
        tracing::debug!(
            component = "quiz_api",
            operation = $operation,
            backend = %$backend,
            "Remote call started"
        );
    };
    (success, $operation:expr, backend = $backend:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            component = "quiz_api",
            operation = $operation,
            backend = %$backend,
            duration_ms = $duration,
            "Remote call completed"
        );
    };
    (error, $operation:expr, backend = $backend:expr, error = $error:expr) => {
        tracing::error!(
            component = "quiz_api",
            operation = $operation,
            backend = %$backend,
            error = %$error,
            "Remote call failed"
        );
    };
    (retry, $operation:expr, attempt = $attempt:expr, max_attempts = $max:expr, error = $error:expr) => {
        tracing::warn!(
            component = "quiz_api",
            operation = $operation,
            attempt = $attempt,
            max_attempts = $max,
            error = %$error,
            "Transient failure, retrying"
        );
    };
}

// ============================================================================
// Session Logging Macros
// ============================================================================

/// Log a quiz session state transition
#[macro_export]
macro_rules! log_session_transition {
    ($session_id:expr, from = $from:expr, to = $to:expr, $msg:expr) => {
        tracing::info!(
            session_id = %$session_id,
            from_state = ?$from,
            to_state = ?$to,
            "Session transition: {}", $msg
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (shutdown, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "shutdown",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Performance Logging Macros
// ============================================================================

/// Log performance metrics with consistent structure
#[macro_export]
macro_rules! log_performance {
    ($operation:expr, duration_ms = $duration:expr, branches = $branches:expr) => {
        tracing::debug!(
            event_type = "performance",
            operation = $operation,
            duration_ms = $duration,
            branch_count = $branches,
            "Performance metrics"
        );
    };
    ($operation:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            event_type = "performance",
            operation = $operation,
            duration_ms = $duration,
            "Performance metrics"
        );
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}
