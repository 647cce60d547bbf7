use approx::assert_relative_eq;
use xtensor::{
    adapt, cast, eval, sqrt, xarray, AlignedArray, Expression, Fix2, Fixed, Layout, XArray,
    XContainer, XTensor, XTensorFixed, XtensorError,
};

#[test]
fn test_fixed_resize_is_noop_for_own_shape() {
    let mut a = XTensorFixed::<f64, Fix2<2, 3>>::new().unwrap();
    a.fill(1.5);
    a[[1, 2]] = 9.0;
    a.resize(&[2, 3]).unwrap();
    a.reshape(&[2, 3]).unwrap();
    assert_eq!(a.shape(), &[2, 3]);
    assert_eq!(a.data(), &[1.5, 1.5, 1.5, 1.5, 1.5, 9.0]);

    assert!(matches!(
        a.resize(&[3, 2]),
        Err(XtensorError::FixedShape { .. })
    ));
    assert!(a.reshape(&[6]).is_err());
    assert_eq!(a.shape(), &[2, 3]);
    assert_eq!(a[[1, 2]], 9.0);
}

#[test]
fn test_fixed_container_on_aligned_storage() {
    let mut a = XContainer::<AlignedArray<f32, 4>, Fixed<Fix2<2, 2>>>::new().unwrap();
    assert_eq!(a.data().as_ptr() as usize % xtensor::STORAGE_ALIGNMENT, 0);
    let b = XArray::from_shape_vec(&[2], vec![1.0f32, 2.0]).unwrap();
    a.add_assign_expr(&b).unwrap();
    a.mul_assign_expr(2.0f32).unwrap();
    assert_eq!(a.data(), &[2.0, 4.0, 2.0, 4.0]);
    // assignment resizes to the expression shape, which a fixed shape refuses
    assert!(a.assign(&b).is_err());
    assert_eq!(a.shape(), &[2, 2]);
}

#[test]
fn test_static_rank_tensor() {
    let mut t = XTensor::<i32, 2>::from_shape(&[2, 2]).unwrap();
    assert!(matches!(
        t.resize(&[4]),
        Err(XtensorError::RankMismatch(2, 1))
    ));
    t.resize(&[3, 1]).unwrap();
    assert_eq!(t.size(), 3);
}

#[test]
fn test_dynamic_resize_and_reshape() {
    let mut a: XArray<i32> = xarray![[1, 2, 3], [4, 5, 6]].unwrap();
    a.reshape(&[3, 2]).unwrap();
    assert_eq!(a[[2, 1]], 6);
    assert!(matches!(
        a.reshape(&[4, 2]),
        Err(XtensorError::SizeMismatch { expected: 6, found: 8 })
    ));
    a.resize(&[2, 2, 2]).unwrap();
    assert_eq!(a.size(), 8);
}

#[test]
fn test_nested_construction() {
    let a: XArray<f64> = xarray![[[1.0], [2.0]], [[3.0], [4.0]]].unwrap();
    assert_eq!(a.shape(), &[2, 2, 1]);
    let v = XArray::from_nested(vec![vec![1, 2], vec![3]]);
    assert!(matches!(v, Err(XtensorError::RaggedNested)));
}

#[test]
fn test_layouts_compare_logically() {
    let row = XArray::from_shape_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
    let col = XArray::from_shape_vec_layout(&[2, 2], vec![1, 3, 2, 4], Layout::ColumnMajor).unwrap();
    assert_eq!(row, col);
    assert_eq!(col.layout(), Layout::ColumnMajor);
    assert_eq!(col.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
}

#[test]
fn test_checked_and_unchecked_access() {
    let a = XArray::from_shape_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
    assert_eq!(*a.at(&[1, 0]).unwrap(), 3);
    assert!(matches!(
        a.at(&[2, 0]),
        Err(XtensorError::IndexOutOfBounds { .. })
    ));
    assert_eq!(a.get(&[0, 5]), None);
    assert_eq!(a[&[1, 1][..]], 4);
}

#[test]
fn test_compound_assignment_broadcasts() {
    let mut a = XArray::from_shape_value(&[2, 3], 1.0).unwrap();
    let row = XArray::from_shape_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
    a.add_assign_expr(&row).unwrap();
    a.mul_assign_expr(2.0).unwrap();
    assert_eq!(a.data(), &[4.0, 6.0, 8.0, 4.0, 6.0, 8.0]);
    let wide = XArray::<f64>::from_shape(&[4, 3]).unwrap();
    assert!(a.sub_assign_expr(&wide).is_err());
    assert_eq!(a.shape(), &[2, 3]);
}

#[test]
fn test_assign_resizes_destination() {
    let a = XArray::from_shape_vec(&[2, 2], vec![1.0, 4.0, 9.0, 16.0]).unwrap();
    let mut out = XArray::<f64>::from_shape(&[1]).unwrap();
    out.assign(sqrt(&a) + 1.0).unwrap();
    assert_eq!(out.shape(), &[2, 2]);
    for (x, e) in out.iter().zip([2.0, 3.0, 4.0, 5.0]) {
        assert_relative_eq!(*x, e);
    }
}

#[test]
fn test_adaptor_shares_caller_memory() {
    let mut buf = vec![0i64; 6];
    {
        let mut a = adapt(&mut buf, [2, 3]).unwrap();
        let ones = XArray::from_shape_value(&[3], 1i64).unwrap();
        a.add_assign_expr(&ones).unwrap();
        a[[1, 2]] = 5;
    }
    assert_eq!(buf, vec![1, 1, 1, 1, 1, 5]);
}

#[test]
fn test_cast_between_element_types() {
    let a = XArray::from_shape_vec(&[3], vec![1.7f64, -2.2, 3.9]).unwrap();
    let b: XArray<i32> = eval(cast::<i32, _>(&a)).unwrap();
    assert_eq!(b.data(), &[1, -2, 3]);
    assert_eq!(cast::<f32, _>(&b).element(&[2]), 3.0f32);
}
