use crate::HvgError;
use num_traits::Float;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DataValidator<'a, T> {
    data: &'a [T],
    start: usize,
}

impl<'a, T: Float> DataValidator<'a, T> {
    pub(crate) fn new(data: &'a [T], start: usize) -> Self {
        Self { data, start }
    }

    /// Checks that every value is ordered and that every position fits in a `usize`.
    pub(crate) fn validate_input_data(&self) -> Result<(), HvgError> {
        if let Some(last_offset) = self.data.len().checked_sub(1) {
            if self.start.checked_add(last_offset).is_none() {
                return Err(HvgError::PositionOverflow { last: usize::MAX });
            }
        }
        match self.data.iter().position(|value| value.is_nan()) {
            Some(n) => Err(HvgError::NanValue { position: self.start + n }),
            None => Ok(()),
        }
    }
}
