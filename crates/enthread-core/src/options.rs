//! Thread creation options and engine stack sizes

use crate::error::{ThreadError, ThreadResult};

/// Bytes per unit of the size options
pub const KB: usize = 1024;

/// Check `name` can be bound as an alias
///
/// Aliases must be non-empty and free of NUL bytes, since they also name
/// the OS thread.
pub fn check_alias(name: &str) -> ThreadResult<()> {
    if name.is_empty() {
        return Err(ThreadError::InvalidOption("alias must not be empty".into()));
    }
    if name.contains('\0') {
        return Err(ThreadError::InvalidOption(format!("alias {:?} contains a NUL byte", name)));
    }
    Ok(())
}

/// Scale a kilobyte count to bytes, `None` on overflow
#[inline]
pub fn kb_to_bytes(kb: usize) -> Option<usize> {
    kb.checked_mul(KB)
}

/// Engine stack sizes of one thread, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackSizes {
    pub local: usize,
    pub global: usize,
    pub trail: usize,
    pub argument: usize,
}

impl StackSizes {
    /// Build from kilobyte counts; sizes that overflow saturate
    pub const fn from_kb(local: usize, global: usize, trail: usize, argument: usize) -> Self {
        Self {
            local: local.saturating_mul(KB),
            global: global.saturating_mul(KB),
            trail: trail.saturating_mul(KB),
            argument: argument.saturating_mul(KB),
        }
    }

    /// Check every area is non-empty
    pub fn validate(&self) -> ThreadResult<()> {
        for (name, size) in self.named() {
            if size == 0 {
                return Err(ThreadError::InvalidOption(format!("{} stack size must be > 0", name)));
            }
        }
        Ok(())
    }

    fn named(&self) -> [(&'static str, usize); 4] {
        [
            ("local", self.local),
            ("global", self.global),
            ("trail", self.trail),
            ("argument", self.argument),
        ]
    }
}

/// Options accepted by thread creation
///
/// Sizes are given in kilobytes; unset sizes fall back to the configured
/// defaults when resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadOptions {
    pub local_kb: Option<usize>,
    pub global_kb: Option<usize>,
    pub trail_kb: Option<usize>,
    pub argument_kb: Option<usize>,
    pub alias: Option<String>,
}

impl ThreadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    // Builder methods

    pub fn local_kb(mut self, kb: usize) -> Self {
        self.local_kb = Some(kb);
        self
    }

    pub fn global_kb(mut self, kb: usize) -> Self {
        self.global_kb = Some(kb);
        self
    }

    pub fn trail_kb(mut self, kb: usize) -> Self {
        self.trail_kb = Some(kb);
        self
    }

    pub fn argument_kb(mut self, kb: usize) -> Self {
        self.argument_kb = Some(kb);
        self
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Parse `(name, value)` pairs such as `("local", "2048")` or
    /// `("alias", "worker")`
    ///
    /// Recognized names: `local`, `global`, `trail`, `argument`, `alias`.
    /// A later pair overrides an earlier one with the same name.
    pub fn from_pairs<I, K, V>(pairs: I) -> ThreadResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut opts = Self::new();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                "local" => opts.local_kb = Some(parse_kb(key, value)?),
                "global" => opts.global_kb = Some(parse_kb(key, value)?),
                "trail" => opts.trail_kb = Some(parse_kb(key, value)?),
                "argument" => opts.argument_kb = Some(parse_kb(key, value)?),
                "alias" => {
                    check_alias(value)?;
                    opts.alias = Some(value.to_string());
                }
                other => {
                    return Err(ThreadError::InvalidOption(format!("unknown option `{}`", other)));
                }
            }
        }
        Ok(opts)
    }

    /// Check the options that do not depend on configuration
    pub fn validate(&self) -> ThreadResult<()> {
        match self.alias.as_deref() {
            Some(name) => check_alias(name),
            None => Ok(()),
        }
    }

    /// Scale the given sizes by 1024, filling unset ones from `defaults`
    pub fn resolve_stacks(&self, defaults: &StackSizes) -> ThreadResult<StackSizes> {
        let stacks = StackSizes {
            local: scale("local", self.local_kb, defaults.local)?,
            global: scale("global", self.global_kb, defaults.global)?,
            trail: scale("trail", self.trail_kb, defaults.trail)?,
            argument: scale("argument", self.argument_kb, defaults.argument)?,
        };
        stacks.validate()?;
        Ok(stacks)
    }
}

fn parse_kb(key: &str, value: &str) -> ThreadResult<usize> {
    match value.parse::<usize>() {
        Ok(kb) if kb > 0 => Ok(kb),
        _ => Err(ThreadError::InvalidOption(format!("{}: `{}` is not a size in KB", key, value))),
    }
}

fn scale(key: &str, kb: Option<usize>, default: usize) -> ThreadResult<usize> {
    match kb {
        None => Ok(default),
        Some(kb) => kb_to_bytes(kb)
            .ok_or_else(|| ThreadError::InvalidOption(format!("{} stack size overflows", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: StackSizes = StackSizes::from_kb(64, 128, 32, 16);

    #[test]
    fn test_resolve_scales_and_defaults() {
        let opts = ThreadOptions::new().local_kb(8).trail_kb(4);
        let stacks = opts.resolve_stacks(&DEFAULTS).unwrap();

        assert_eq!(stacks.local, 8 * 1024);
        assert_eq!(stacks.trail, 4 * 1024);
        assert_eq!(stacks.global, DEFAULTS.global);
        assert_eq!(stacks.argument, DEFAULTS.argument);
    }

    #[test]
    fn test_resolve_rejects_zero() {
        let opts = ThreadOptions::new().global_kb(0);
        assert!(matches!(opts.resolve_stacks(&DEFAULTS), Err(ThreadError::InvalidOption(_))));
    }

    #[test]
    fn test_resolve_rejects_overflow() {
        let opts = ThreadOptions::new().argument_kb(usize::MAX);
        assert!(opts.resolve_stacks(&DEFAULTS).is_err());
    }

    #[test]
    fn test_from_pairs() {
        let opts = ThreadOptions::from_pairs([("local", "256"), ("alias", "logger")]).unwrap();
        assert_eq!(opts, ThreadOptions::new().local_kb(256).alias("logger"));
    }

    #[test]
    fn test_from_pairs_errors() {
        assert!(ThreadOptions::from_pairs([("priority", "1")]).is_err());
        assert!(ThreadOptions::from_pairs([("trail", "lots")]).is_err());
        assert!(ThreadOptions::from_pairs([("local", "0")]).is_err());
        assert!(ThreadOptions::from_pairs([("alias", "  ")]).is_err());
        assert!(ThreadOptions::from_pairs([("alias", "a\0b")]).is_err());
    }

    #[test]
    fn test_builder_alias_checked_like_pairs() {
        assert!(ThreadOptions::new().alias("worker").validate().is_ok());
        assert!(ThreadOptions::new().validate().is_ok());
        assert!(matches!(
            ThreadOptions::new().alias("").validate(),
            Err(ThreadError::InvalidOption(_))
        ));
        assert!(matches!(
            ThreadOptions::new().alias("a\0b").validate(),
            Err(ThreadError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_from_kb_saturates() {
        let stacks = StackSizes::from_kb(usize::MAX, 1, 1, 1);
        assert_eq!(stacks.local, usize::MAX);
        assert_eq!(stacks.global, 1024);
    }

    #[test]
    fn test_kb_to_bytes_overflow() {
        assert_eq!(kb_to_bytes(4), Some(4096));
        assert_eq!(kb_to_bytes(usize::MAX), None);
    }
}
