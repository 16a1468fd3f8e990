use crate::error::{AllocError, Result};
use std::fmt;

/// Inclusive `[min, max]` interval of UIDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidRange {
    min: u32,
    max: u32,
}

impl UidRange {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            return Err(AllocError::ConfigurationInvalid(format!(
                "min_uid {} is greater than max_uid {}",
                min, max
            )));
        }
        Ok(UidRange { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Number of UIDs in the interval. Never zero.
    pub fn len(&self) -> u64 {
        u64::from(self.max - self.min) + 1
    }

    pub fn contains(&self, uid: u32) -> bool {
        (self.min..=self.max).contains(&uid)
    }
}

impl fmt::Display for UidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_covers_full_u32() {
        assert_eq!(UidRange::new(5, 5).unwrap().len(), 1);
        assert_eq!(UidRange::new(0, u32::MAX).unwrap().len(), 1 << 32);
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            UidRange::new(10, 9),
            Err(AllocError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = UidRange::new(3000, 3002).unwrap();
        assert!(range.contains(3000));
        assert!(range.contains(3002));
        assert!(!range.contains(2999));
        assert!(!range.contains(3003));
        assert_eq!(range.to_string(), "[3000, 3002]");
    }
}
