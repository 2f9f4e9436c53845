use std::error::Error;

use clap::Parser;

use frame_layout_common::return_address::{PlainReturnAddress, ReturnAddressAccessor, SignedReturnAddress};
use monitor_state::{LockingMode, NarrowOopEncoding};

use crate::tracing::TracingSettings;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VerificationOptions {
    /// Cross check the engine's monitor fixups against the per kind scanners.
    pub verify_continuations: bool,
    /// Derive interpreted frame tops from the oop map rather than the recorded stack pointer.
    pub verify_expression_stack: bool,
}

impl VerificationOptions {
    pub fn enabled() -> Self {
        Self { verify_continuations: true, verify_expression_stack: true }
    }

    pub fn disabled() -> Self {
        Self { verify_continuations: false, verify_expression_stack: false }
    }
}

impl Default for VerificationOptions {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::enabled()
        } else {
            Self::disabled()
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ReturnAddressStrategy {
    #[default]
    Plain,
    Signed { key: usize },
}

impl ReturnAddressStrategy {
    pub fn accessor(&self) -> Box<dyn ReturnAddressAccessor> {
        match *self {
            ReturnAddressStrategy::Plain => Box::new(PlainReturnAddress),
            ReturnAddressStrategy::Signed { key } => Box::new(SignedReturnAddress::new(key)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContinuationOptions {
    pub verification: VerificationOptions,
    pub locking_mode: LockingMode,
    pub return_address: ReturnAddressStrategy,
    // heap wide compressed reference encoding, if references are compressed
    pub narrow_oops: Option<NarrowOopEncoding>,
    pub tracing: TracingSettings,
}

impl ContinuationOptions {
    pub fn test_options() -> Self {
        Self {
            verification: VerificationOptions::enabled(),
            locking_mode: LockingMode::Lightweight,
            return_address: ReturnAddressStrategy::Plain,
            narrow_oops: None,
            tracing: TracingSettings::disabled(),
        }
    }

    pub fn with_narrow_oops(mut self, encoding: NarrowOopEncoding) -> Self {
        self.narrow_oops = Some(encoding);
        self
    }

    pub fn with_return_address(mut self, strategy: ReturnAddressStrategy) -> Self {
        self.return_address = strategy;
        self
    }
}

fn parse_key(s: &str) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let res = match s.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16)?,
        None => s.parse::<usize>()?,
    };
    if res == 0 {
        return Err(format!("invalid signing key `{}`: must be non zero", s).into());
    }
    Ok(res)
}

#[derive(Parser, Debug, Clone)]
#[command(name = "continuation-helper")]
pub struct ContinuationArgs {
    #[arg(long, help = "cross check monitor fixups for every frame that is frozen")]
    verify_continuations: bool,
    #[arg(long, help = "compute interpreted frame tops from the oop map")]
    verify_expression_stack: bool,
    #[arg(long, default_value_t = LockingMode::Lightweight, help = "legacy or lightweight")]
    locking_mode: LockingMode,
    #[arg(long, value_name = "KEY", value_parser = parse_key, help = "store return addresses signed with KEY")]
    sign_return_addresses: Option<usize>,
    #[arg(long)]
    trace_classification: bool,
    #[arg(long)]
    trace_monitor_fixup: bool,
    #[arg(long)]
    trace_return_patch: bool,
    #[arg(long)]
    trace_verification: bool,
}

impl From<ContinuationArgs> for ContinuationOptions {
    fn from(args: ContinuationArgs) -> Self {
        Self {
            verification: VerificationOptions {
                verify_continuations: args.verify_continuations,
                verify_expression_stack: args.verify_expression_stack,
            },
            locking_mode: args.locking_mode,
            return_address: match args.sign_return_addresses {
                None => ReturnAddressStrategy::Plain,
                Some(key) => ReturnAddressStrategy::Signed { key },
            },
            narrow_oops: None,
            tracing: TracingSettings {
                trace_classification: args.trace_classification,
                trace_monitor_fixup: args.trace_monitor_fixup,
                trace_return_patch: args.trace_return_patch,
                trace_verification: args.trace_verification,
            },
        }
    }
}
