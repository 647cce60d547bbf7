//! Memory layout flags.

/// Order in which strides are computed from a shape.
///
/// `RowMajor` makes the last axis contiguous, `ColumnMajor` the first.
/// `Dynamic` marks containers whose strides were supplied by the caller and
/// follow neither order. `Any` means either order is acceptable; 1-d
/// containers report it because both orders coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    #[default]
    RowMajor,
    ColumnMajor,
    Dynamic,
    Any,
}

impl Layout {
    /// The concrete order used to compute strides for this flag.
    ///
    /// `Dynamic` and `Any` fall back to [`crate::DEFAULT_LAYOUT`].
    #[inline]
    pub fn storage_order(self) -> Layout {
        match self {
            Layout::RowMajor | Layout::ColumnMajor => self,
            Layout::Dynamic | Layout::Any => crate::DEFAULT_LAYOUT,
        }
    }

    /// Whether data laid out as `self` can be read linearly as `other`.
    #[inline]
    pub fn compatible_with(self, other: Layout) -> bool {
        self == other || self == Layout::Any || other == Layout::Any
    }
}

/// Detect the layout of a stride sequence for the given shape.
///
/// Size-1 axes are ignored since their stride carries no information.
pub fn detect_layout(shape: &[usize], strides: &[isize]) -> Layout {
    let effective = shape.iter().filter(|&&n| n != 1).count();
    if effective <= 1 && is_dense(shape, strides, Layout::RowMajor) {
        return Layout::Any;
    }
    if is_dense(shape, strides, Layout::RowMajor) {
        Layout::RowMajor
    } else if is_dense(shape, strides, Layout::ColumnMajor) {
        Layout::ColumnMajor
    } else {
        Layout::Dynamic
    }
}

fn is_dense(shape: &[usize], strides: &[isize], order: Layout) -> bool {
    let mut expected: isize = 1;
    let mut check = |i: usize| -> bool {
        if shape[i] == 1 {
            return true;
        }
        let ok = strides[i] == expected;
        expected *= shape[i] as isize;
        ok
    };
    match order {
        Layout::ColumnMajor => (0..shape.len()).all(&mut check),
        _ => (0..shape.len()).rev().all(&mut check),
    }
}
