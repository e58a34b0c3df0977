//! Text capture surface
//!
//! Holds the log text and optional context a user is about to submit, plus
//! a few canned sample logs for trying the tool out.

use std::path::Path;

use crate::error::{ErrorContext, Result, ServiceError};
use crate::services::explainer::AnalysisRequest;

/// A canned log that can be loaded into the capture surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Short identifier used on the command line
    pub name: &'static str,
    /// One-line description
    pub title: &'static str,
    pub log: &'static str,
    pub context: &'static str,
}

pub const SAMPLES: &[Sample] = &[
    Sample {
        name: "db-timeout",
        title: "Database connection timeout",
        log: "2024-03-11T09:14:02.117Z ERROR [pool-3-thread-7] c.a.orders.OrderRepository - Failed to acquire connection\n\
org.postgresql.util.PSQLException: Connection to db-primary:5432 refused or timed out after 30000ms\n\
\tat org.postgresql.core.v3.ConnectionFactoryImpl.openConnectionImpl(ConnectionFactoryImpl.java:331)\n\
\tat com.zaxxer.hikari.pool.HikariPool.getConnection(HikariPool.java:181)\n\
2024-03-11T09:14:02.118Z WARN  [pool-3-thread-7] c.z.hikari.pool.HikariPool - HikariPool-1 - Connection is not available, request timed out after 30004ms (total=20, active=20, idle=0, waiting=37)",
        context: "Order service under peak traffic after a marketing campaign",
    },
    Sample {
        name: "null-pointer",
        title: "Null pointer in request handler",
        log: "Exception in thread \"http-nio-8080-exec-4\" java.lang.NullPointerException: Cannot invoke \"com.acme.user.Profile.getLocale()\" because \"profile\" is null\n\
\tat com.acme.web.GreetingController.greet(GreetingController.java:42)\n\
\tat java.base/jdk.internal.reflect.DirectMethodHandleAccessor.invoke(DirectMethodHandleAccessor.java:103)\n\
\tat org.springframework.web.method.support.InvocableHandlerMethod.doInvoke(InvocableHandlerMethod.java:205)",
        context: "Happens only for users created through the legacy signup flow",
    },
    Sample {
        name: "bad-gateway",
        title: "502 from an upstream service",
        log: "2024/03/11 10:02:45 [error] 2817#2817: *91234 upstream prematurely closed connection while reading response header from upstream, client: 10.0.4.17, server: api.example.com, request: \"POST /v1/checkout HTTP/1.1\", upstream: \"http://10.0.8.3:9000/v1/checkout\", host: \"api.example.com\"\n\
10.0.4.17 - - [11/Mar/2024:10:02:45 +0000] \"POST /v1/checkout HTTP/1.1\" 502 157 \"-\" \"okhttp/4.12.0\"",
        context: "nginx in front of the payments service, started after a deploy",
    },
    Sample {
        name: "oom-kill",
        title: "Container killed for memory",
        log: "[Mon Mar 11 11:20:31 2024] Memory cgroup out of memory: Killed process 48213 (node) total-vm:4513228kB, anon-rss:2097152kB, file-rss:0kB, shmem-rss:0kB, UID:1000 pgtables:5120kB oom_score_adj:0\n\
Events:\n\
Warning  OOMKilled  2m   kubelet  Container report-worker exceeded its memory limit (2Gi)\n\
Normal   Pulled     2m   kubelet  Container image \"registry.local/report-worker:1.8.2\" already present on machine\n\
Warning  BackOff    30s  kubelet  Back-off restarting failed container",
        context: "Nightly report job, input size doubled this month",
    },
];

/// Look up a sample by name (case-insensitive)
pub fn sample(name: &str) -> Option<&'static Sample> {
    SAMPLES
        .iter()
        .find(|sample| sample.name.eq_ignore_ascii_case(name.trim()))
}

/// Names of all samples in display order
pub fn sample_names() -> Vec<&'static str> {
    SAMPLES.iter().map(|sample| sample.name).collect()
}

/// Log text and context waiting to be submitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSurface {
    log: String,
    context: String,
}

impl CaptureSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Replace the log text
    pub fn set_log(&mut self, log: impl Into<String>) {
        self.log = log.into();
    }

    /// Replace the context text
    pub fn set_context(&mut self, context: impl Into<String>) {
        self.context = context.into();
    }

    /// Replace the log text with a file's content.
    ///
    /// Content is kept byte for byte; invalid UTF-8 sequences become U+FFFD.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ServiceError::validation(format!("Cannot read {}: {}", path.display(), e))
                .with_context(ErrorContext::for_service("capture").with("path", path.display()))
        })?;

        self.load_bytes(&bytes);
        Ok(())
    }

    /// Replace the log text with raw bytes, decoded as UTF-8 lossily
    pub fn load_bytes(&mut self, bytes: &[u8]) {
        self.log = String::from_utf8_lossy(bytes).into_owned();
    }

    /// Replace both fields with a canned sample
    pub fn load_sample(&mut self, name: &str) -> Result<&'static Sample> {
        let found = sample(name).ok_or_else(|| {
            ServiceError::validation(format!(
                "Unknown sample '{}'; available: {}",
                name,
                sample_names().join(", ")
            ))
        })?;

        self.log = found.log.to_string();
        self.context = found.context.to_string();
        Ok(found)
    }

    /// Whether submission is allowed; an empty log disables it
    pub fn can_submit(&self) -> bool {
        !self.log.trim().is_empty()
    }

    /// Build the request to submit, optionally redacted
    pub fn to_request(&self, redact: bool) -> AnalysisRequest {
        let request = AnalysisRequest::new(self.log.clone(), self.context.trim());
        if redact {
            request.redacted()
        } else {
            request
        }
    }

    /// Clear both fields
    pub fn clear(&mut self) {
        self.log.clear();
        self.context.clear();
    }
}
