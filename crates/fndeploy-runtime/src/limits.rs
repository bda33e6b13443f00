/// Inclusive bounds the platform enforces for one action limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBounds {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
}

/// Outcome of checking an optional limit value against its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitCheck {
    Absent,
    Valid(i64),
    OutOfRange(i64),
}

impl LimitBounds {
    pub fn check(&self, value: Option<i64>) -> LimitCheck {
        match value {
            None => LimitCheck::Absent,
            Some(v) if (self.min..=self.max).contains(&v) => LimitCheck::Valid(v),
            Some(v) => LimitCheck::OutOfRange(v),
        }
    }
}

/// Milliseconds.
pub const TIMEOUT: LimitBounds = LimitBounds {
    name: "timeout",
    min: 100,
    max: 300_000,
};

/// Megabytes.
pub const MEMORY: LimitBounds = LimitBounds {
    name: "memorySize",
    min: 128,
    max: 512,
};

/// Megabytes.
pub const LOG_SIZE: LimitBounds = LimitBounds {
    name: "logSize",
    min: 0,
    max: 10,
};

/// Limits accepted by the manifest syntax but not settable per action.
pub const UNSUPPORTED_LIMITS: &[&str] = &[
    "concurrentActivations",
    "userInvocationRate",
    "codeSize",
    "parameterSize",
];
