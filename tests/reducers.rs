use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use xtensor::traits::Plus;
use xtensor::{
    amax, cumsum, mean, norm_l2, prod, reduce, stddev, sum, variance, xarray, Axes,
    EvaluationStrategy, Expression, ReducerOptions, XArray, XtensorError,
};

fn opts<T>() -> ReducerOptions<T> {
    ReducerOptions::default()
}

#[test]
fn test_sum_scenario() {
    let a: XArray<f64> = xarray![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].unwrap();
    assert_eq!(sum(&a, [0], opts()).unwrap().eval().unwrap().data(), &[5.0, 7.0, 9.0]);
    assert_eq!(sum(&a, [1], opts()).unwrap().eval().unwrap().data(), &[6.0, 15.0]);
    let total = sum(&a, Axes::All, opts()).unwrap();
    assert_eq!(total.shape().unwrap().len(), 0);
    assert_eq!(total.value().unwrap(), 21.0);
}

#[test]
fn test_reduction_excludes_axis_and_visits_each_once() {
    let a = XArray::from_shape_vec(&[2, 3, 4], (0..24).collect::<Vec<i64>>()).unwrap();
    let r = reduce(Plus, &a, [1], opts()).unwrap();
    assert_eq!(r.shape().unwrap(), [2, 4]);
    for i in 0..2 {
        for k in 0..4 {
            let visited: Vec<i64> = r.reducing_iter(&[i, k]).collect();
            assert_eq!(visited.len(), 3);
            let expected: Vec<i64> = (0..3).map(|j| a[[i, j, k]]).collect();
            assert_eq!(visited, expected);
            assert_eq!(r.element(&[i, k]), expected.iter().sum::<i64>());
        }
    }
}

#[test]
fn test_lazy_and_immediate_agree_on_random_input() {
    let mut rng = StdRng::seed_from_u64(42);
    let shape = [3, 4, 5];
    let data: Vec<f64> = (0..60).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let a = XArray::from_shape_vec(&shape, data).unwrap();
    for axes in [vec![0], vec![1], vec![2], vec![0, 2], vec![2, 1, 0]] {
        let lazy = sum(&a, axes.clone(), opts()).unwrap();
        let eager = sum(&a, axes, opts().immediate()).unwrap();
        assert_eq!(eager.strategy(), EvaluationStrategy::Immediate);
        let (l, e) = (lazy.eval().unwrap(), eager.eval().unwrap());
        assert_eq!(l.shape(), e.shape());
        for (x, y) in l.iter().zip(e.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_keep_dims_broadcasts_back() {
    let a: XArray<f64> = xarray![[1.0, 2.0], [3.0, 5.0]].unwrap();
    let peak = amax(&a, [1], opts().keep_dims(true)).unwrap();
    assert_eq!(peak.shape().unwrap(), [2, 1]);
    let scaled = XArray::from_expr(&a / &peak).unwrap();
    assert_eq!(scaled.data(), &[0.5, 1.0, 0.6, 1.0]);
}

#[test]
fn test_statistics() {
    let a: XArray<f64> = xarray![[2.0, 4.0, 4.0, 4.0], [5.0, 5.0, 7.0, 9.0]].unwrap();
    assert_relative_eq!(mean(&a, Axes::All, opts()).unwrap().element(&[]), 5.0);
    assert_relative_eq!(variance(&a, Axes::All, opts()).unwrap().element(&[]), 4.0);
    assert_relative_eq!(stddev(&a, Axes::All, opts()).unwrap().element(&[]), 2.0);
    let rows = XArray::from_expr(mean(&a, [1], opts()).unwrap()).unwrap();
    assert_eq!(rows.data(), &[3.5, 6.5]);
}

#[test]
fn test_norm_of_difference() {
    let a: XArray<f64> = xarray![1.0, 2.0, 3.0].unwrap();
    let b: XArray<f64> = xarray![4.0, 6.0, 3.0].unwrap();
    let d = norm_l2(&a - &b, Axes::All, opts()).unwrap();
    assert_relative_eq!(d.element(&[]), 5.0);
}

#[test]
fn test_accumulate_then_reduce() {
    let a = XArray::from_shape_vec(&[2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
    let c = cumsum(&a, Some(1)).unwrap();
    let last = amax(&c, [1], opts()).unwrap().eval().unwrap();
    assert_eq!(last.data(), &[6, 15]);
}

#[test]
fn test_mean_over_nothing_is_an_error() {
    let empty = XArray::<i64>::from_shape(&[0]).unwrap();
    assert!(matches!(
        mean(&empty, Axes::All, opts()),
        Err(XtensorError::EmptyReduction)
    ));

    let no_columns = XArray::<i32>::from_shape(&[3, 0]).unwrap();
    assert!(matches!(
        mean(&no_columns, [1], opts()),
        Err(XtensorError::EmptyReduction)
    ));
    let floats = XArray::<f64>::from_shape(&[3, 0]).unwrap();
    assert!(matches!(
        variance(&floats, [1], opts()),
        Err(XtensorError::EmptyReduction)
    ));

    // no rows: every result element still averages three values
    let no_rows = XArray::<i64>::from_shape(&[0, 3]).unwrap();
    let m = mean(&no_rows, [1], opts()).unwrap();
    assert_eq!(m.shape().unwrap(), [0]);
    assert_eq!(XArray::from_expr(m).unwrap().size(), 0);
}

/// Min-plus semiring: "addition" takes the minimum, "multiplication" adds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MinPlus(f64);

impl std::ops::Add for MinPlus {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        MinPlus(self.0.min(rhs.0))
    }
}

impl std::ops::Mul for MinPlus {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        MinPlus(self.0 + rhs.0)
    }
}

impl num_traits::Zero for MinPlus {
    fn zero() -> Self {
        MinPlus(f64::INFINITY)
    }
    fn is_zero(&self) -> bool {
        self.0 == f64::INFINITY
    }
}

impl num_traits::One for MinPlus {
    fn one() -> Self {
        MinPlus(0.0)
    }
}

impl xtensor::MaybeNan for MinPlus {}

#[test]
fn test_custom_semiring_elements() {
    let costs = XArray::from_shape_vec(
        &[2, 2],
        vec![MinPlus(3.0), MinPlus(1.0), MinPlus(4.0), MinPlus(1.5)],
    )
    .unwrap();

    let cheapest = sum(&costs, [1], opts()).unwrap().eval().unwrap();
    assert_eq!(cheapest.data(), &[MinPlus(1.0), MinPlus(1.5)]);
    let path = prod(&costs, [0], opts()).unwrap().eval().unwrap();
    assert_eq!(path.data(), &[MinPlus(7.0), MinPlus(2.5)]);

    let running = cumsum(&costs, None).unwrap();
    assert_eq!(
        running.data(),
        &[MinPlus(3.0), MinPlus(1.0), MinPlus(1.0), MinPlus(1.0)]
    );

    let nothing = XArray::<MinPlus>::from_shape(&[0]).unwrap();
    assert_eq!(sum(&nothing, Axes::All, opts()).unwrap().value().unwrap(), MinPlus(f64::INFINITY));
    let unit: XArray<MinPlus> = xtensor::ones(&[2]).unwrap();
    assert_eq!(unit.data(), &[MinPlus(0.0), MinPlus(0.0)]);
}
