use approx::assert_relative_eq;
use xtensor::{
    arange, eye, linspace, ones, s, sum, zeros, Axes, Expression, ReducerOptions, Slice, XArray,
    XtensorError,
};

#[test]
fn test_slice_macro_matches_explicit_slices() {
    let mut cube = arange(0, 24, 1).unwrap();
    cube.reshape(&[2, 3, 4]).unwrap();

    let by_macro = cube.slice(&s![1, 1.., ..]).unwrap();
    let explicit = cube
        .slice(&[Slice::Index(1), Slice::Range { start: Some(1), stop: None, step: 1 }])
        .unwrap();
    assert_eq!(by_macro.dims(), &[2, 4]);
    assert_eq!(
        by_macro.into_owned().unwrap(),
        explicit.into_owned().unwrap()
    );
}

#[test]
fn test_negative_step_walks_backwards() {
    let a = arange(0, 6, 1).unwrap();
    let rev = a.slice(&[Slice::every(-1)]).unwrap();
    assert_eq!(rev.into_owned().unwrap().data(), &[5, 4, 3, 2, 1, 0]);
    let skip = a.slice(&[Slice::stepped(-1, 0, -2)]).unwrap();
    assert_eq!(skip.into_owned().unwrap().data(), &[5, 3, 1]);
    let clamped = a.slice(&[Slice::range(-100, 100)]).unwrap();
    assert_eq!(clamped.len(), 6);
}

#[test]
fn test_newaxis_builds_outer_product() {
    let x = arange(1.0, 4.0, 1.0).unwrap();
    let col = x.slice(&[Slice::all(), Slice::NewAxis]).unwrap();
    let row = x.slice(&[Slice::NewAxis, Slice::all()]).unwrap();
    let outer = XArray::from_expr(&col * &row).unwrap();
    assert_eq!(outer.shape(), &[3, 3]);
    assert_eq!(outer.data(), &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 3.0, 6.0, 9.0]);
}

#[test]
fn test_write_through_diagonal_blocks() {
    let mut m = zeros::<f64>(&[4, 4]).unwrap();
    let block = eye::<f64>(2).unwrap();
    m.slice_mut(&[Slice::range(0, 2), Slice::range(0, 2)])
        .unwrap()
        .assign(&block)
        .unwrap();
    m.slice_mut(&[Slice::range(2, 4), Slice::range(2, 4)])
        .unwrap()
        .assign(&block * 3.0)
        .unwrap();
    let trace = (0..4).map(|i| m[[i, i]]).sum::<f64>();
    assert_eq!(trace, 8.0);
    let total = sum(&m, Axes::All, ReducerOptions::default()).unwrap();
    assert_eq!(total.value().unwrap(), 8.0);
}

#[test]
fn test_flip_then_squeeze_round_trip() {
    let mut a = arange(0, 6, 1).unwrap();
    a.reshape(&[1, 2, 3]).unwrap();
    let flipped = a.view().flip(2).unwrap().squeeze();
    assert_eq!(flipped.dims(), &[2, 3]);
    assert_eq!(flipped.into_owned().unwrap().data(), &[2, 1, 0, 5, 4, 3]);
    let back = a.view().squeeze().expand_dims(0).unwrap();
    assert_eq!(back.dims(), a.shape());
}

#[test]
fn test_slice_errors_leave_data_alone() {
    let mut a = ones::<i32>(&[2, 2]).unwrap();
    assert_eq!(
        a.slice(&[Slice::Index(2)]).unwrap_err(),
        XtensorError::SliceOutOfBounds {
            axis: 0,
            index: 2,
            extent: 2
        }
    );
    assert_eq!(
        a.slice_mut(&[Slice::every(0)]).unwrap_err(),
        XtensorError::ZeroStep
    );
    assert_eq!(a.data(), &[1, 1, 1, 1]);
}

#[test]
fn test_linspace_mean_matches_midpoint() {
    let x = linspace(-2.0f64, 6.0, 101, true).unwrap();
    let m = xtensor::mean(&x, Axes::All, ReducerOptions::default()).unwrap();
    assert_relative_eq!(m.element(&[]), 2.0, epsilon = 1e-12);
    assert_eq!(x.element(&[100]), 6.0);
}
