//! Sentinel-padded arrays for the engine.
//!
//! Engine primitives that take arrays skip position 0 and read the data from
//! positions `1..=len`. Every array handed to the engine is built here, lives
//! only for the duration of one engine call, and carries an inert
//! `(0, 0.0)` sentinel in slot 0.

use std::ffi::c_int;

use crate::error::{Error, Result};

/// Owned array with a sentinel in slot 0.
#[derive(Debug)]
pub(crate) struct Padded<T> {
    slots: Vec<T>,
}

impl<T: Copy> Padded<T> {
    fn with_data(sentinel: T, data: impl ExactSizeIterator<Item = T>) -> Self {
        let mut slots = Vec::with_capacity(data.len() + 1);
        slots.push(sentinel);
        slots.extend(data);
        Self { slots }
    }

    /// `len` data slots, all set to `fill`, for the engine to write into.
    fn filled(len: usize, fill: T) -> Self {
        Self {
            slots: vec![fill; len + 1],
        }
    }

    fn len(&self) -> c_int {
        (self.slots.len() - 1) as c_int
    }

    fn as_ptr(&self) -> *const T {
        self.slots.as_ptr()
    }

    fn as_mut_ptr(&mut self) -> *mut T {
        self.slots.as_mut_ptr()
    }

    fn data(&self) -> &[T] {
        &self.slots[1..]
    }
}

fn native_indices(indices: &[usize]) -> impl ExactSizeIterator<Item = c_int> + '_ {
    indices.iter().map(|&i| i as c_int)
}

pub(crate) fn ensure_same_length(indices: usize, values: usize) -> Result<()> {
    if indices == values {
        Ok(())
    } else {
        Err(Error::MismatchedLength { indices, values })
    }
}

/// Hands `(len, ind, val)` for 1-based `indices` and `values` to `call`.
///
/// Fails before allocating if the lengths differ.
pub(crate) fn with_pairs<R>(
    indices: &[usize],
    values: &[f64],
    call: impl FnOnce(c_int, *const c_int, *const f64) -> R,
) -> Result<R> {
    ensure_same_length(indices.len(), values.len())?;
    let ind = Padded::with_data(0, native_indices(indices));
    let val = Padded::with_data(0.0, values.iter().copied());
    Ok(call(ind.len(), ind.as_ptr(), val.as_ptr()))
}

/// Hands `(ne, ia, ja, ar)` for a triplet matrix to `call`.
pub(crate) fn with_triplets<R>(
    rows: &[usize],
    columns: &[usize],
    values: &[f64],
    call: impl FnOnce(c_int, *const c_int, *const c_int, *const f64) -> R,
) -> Result<R> {
    ensure_same_length(rows.len(), values.len())?;
    ensure_same_length(columns.len(), values.len())?;
    let ia = Padded::with_data(0, native_indices(rows));
    let ja = Padded::with_data(0, native_indices(columns));
    let ar = Padded::with_data(0.0, values.iter().copied());
    Ok(call(ar.len(), ia.as_ptr(), ja.as_ptr(), ar.as_ptr()))
}

/// Hands `(len, num)` for a list of 1-based indices to `call`.
pub(crate) fn with_indices<R>(indices: &[usize], call: impl FnOnce(c_int, *const c_int) -> R) -> R {
    let num = Padded::with_data(0, native_indices(indices));
    call(num.len(), num.as_ptr())
}

/// Lets the engine write up to `capacity` pairs into padded buffers and reads
/// back the `len` it reports, without the sentinel.
pub(crate) fn read_pairs(capacity: usize, call: impl FnOnce(*mut c_int, *mut f64) -> c_int) -> Vec<(usize, f64)> {
    let mut ind = Padded::filled(capacity, 0);
    let mut val = Padded::filled(capacity, 0.0);
    let len = call(ind.as_mut_ptr(), val.as_mut_ptr()).clamp(0, capacity as c_int) as usize;
    ind.data()[..len]
        .iter()
        .zip(&val.data()[..len])
        .map(|(&i, &v)| (i as usize, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Copies what the engine would see, sentinel included.
    unsafe fn raw<T: Copy>(ptr: *const T, len: c_int) -> Vec<T> {
        unsafe { std::slice::from_raw_parts(ptr, len as usize + 1) }.to_vec()
    }

    #[test]
    fn test_sentinel_layout_for_every_length() {
        for n in 0..6usize {
            let indices: Vec<usize> = (1..=n).rev().collect();
            let values: Vec<f64> = (0..n).map(|k| k as f64 * 1.5 - 2.0).collect();
            with_pairs(&indices, &values, |len, ind, val| {
                assert_eq!(len as usize, n);
                let ind = unsafe { raw(ind, len) };
                let val = unsafe { raw(val, len) };
                assert_eq!(ind[0], 0);
                assert_eq!(val[0], 0.0);
                let expected: Vec<c_int> = indices.iter().map(|&i| i as c_int).collect();
                assert_eq!(&ind[1..], expected.as_slice());
                assert_eq!(&val[1..], values.as_slice());
            })
            .unwrap();
        }
    }

    #[test]
    fn test_mismatched_length_never_calls() {
        let called = Cell::new(false);
        let err = with_pairs(&[1, 2, 3], &[1.0, 2.0], |_, _, _| called.set(true)).unwrap_err();
        assert_eq!(err, Error::MismatchedLength { indices: 3, values: 2 });
        assert!(!called.get());

        let err = with_triplets(&[1], &[1, 2], &[1.0], |_, _, _, _| called.set(true)).unwrap_err();
        assert!(matches!(err, Error::MismatchedLength { .. }));
        assert!(!called.get());
    }

    #[test]
    fn test_triplets_and_indices() {
        with_triplets(&[1, 2], &[3, 1], &[4.0, 5.0], |ne, ia, ja, ar| {
            assert_eq!(ne, 2);
            assert_eq!(unsafe { raw(ia, ne) }, vec![0, 1, 2]);
            assert_eq!(unsafe { raw(ja, ne) }, vec![0, 3, 1]);
            assert_eq!(unsafe { raw(ar, ne) }, vec![0.0, 4.0, 5.0]);
        })
        .unwrap();

        with_indices(&[], |len, num| {
            assert_eq!(len, 0);
            assert_eq!(unsafe { raw(num, len) }, vec![0]);
        });
    }

    #[test]
    fn test_read_back_drops_sentinel() {
        let pairs = read_pairs(4, |ind, val| unsafe {
            // the engine writes positions 1..=2 only
            *ind.add(1) = 3;
            *val.add(1) = 0.5;
            *ind.add(2) = 4;
            *val.add(2) = -1.0;
            2
        });
        assert_eq!(pairs, vec![(3, 0.5), (4, -1.0)]);
        assert!(read_pairs(0, |_, _| 0).is_empty());
    }
}
