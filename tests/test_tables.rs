use approx::assert_abs_diff_eq;
use opticorr::tables::{
    build_radial_kernel, default_source, nearest_index, upper_index, CoeffWTable, FourierTable,
    FourierTableCache, FresnelTable, TableSource,
};
use opticorr::types::ResolutionClass;

#[test]
fn test_angle_index_reference_table() {
    assert_eq!(nearest_index(0.0), 0);
    assert_eq!(nearest_index(5.0), 1);
    assert_eq!(nearest_index(16.0), 2);
    assert_eq!(nearest_index(90.0), 12);

    assert_eq!(upper_index(0.0), 1);
    assert_eq!(upper_index(5.0), 2);
    assert_eq!(upper_index(16.0), 2);
    assert_eq!(upper_index(80.0), 12);
    assert_eq!(upper_index(90.0), 12);
}

#[test]
fn test_fourier_cache_returns_identical_content() {
    let source = default_source();
    let cache = FourierTableCache::new();

    for model in [0, 3, 7] {
        let first = cache.get(model, &source).expect("first load");
        let second = cache.get(model, &source).expect("cached load");

        // repeated requests come from the cache: same allocation and,
        // by construction, content-identical tables
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(first.extinction(), second.extinction());
        let probe_first = first.primary_reflectance(30.0, 12.0, 60.0);
        let probe_second = second.primary_reflectance(30.0, 12.0, 60.0);
        assert_eq!(probe_first.to_bits(), probe_second.to_bits());
    }
}

#[test]
fn test_fourier_cache_loads_concurrently() {
    let source = default_source();
    let cache = std::sync::Arc::new(FourierTableCache::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = std::sync::Arc::clone(&cache);
            std::thread::spawn(move || {
                let source = default_source();
                cache.get(2, &source).expect("concurrent load").extinction()
            })
        })
        .collect();

    let extinctions: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(extinctions.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_coeff_w_rows_are_normalized() {
    let source = default_source();
    let table = CoeffWTable::load(&source).expect("load weight rows");

    for class in [ResolutionClass::Full, ResolutionClass::Reduced] {
        let weights = table.weights_for(class);
        println!(
            "{:?} resolution: {} models x {} bins",
            class,
            weights.nrows(),
            weights.ncols()
        );
        for (model, row) in weights.rows().into_iter().enumerate() {
            let total: f64 = row.sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-3);
            assert!(
                row.iter().all(|&w| w >= 0.0),
                "model {} has a negative weight",
                model
            );
        }
    }
}

#[test]
fn test_radial_kernel_shape_and_corners() {
    let source = default_source();
    let table = CoeffWTable::load(&source).expect("load weight rows");
    let profile = table
        .profile_for(0, ResolutionClass::Full)
        .expect("model 0 profile");

    let n = profile.len();
    let kernel = build_radial_kernel(&profile);
    let side = 2 * n - 1;

    assert_eq!(kernel.dim(), (side, side));
    assert_eq!(kernel.len(), side * side);
    assert_eq!(kernel[[0, 0]], 0.0);
    assert_eq!(kernel[[0, side - 1]], 0.0);
    assert_eq!(kernel[[side - 1, 0]], 0.0);
    assert_eq!(kernel[[side - 1, side - 1]], 0.0);
    assert_abs_diff_eq!(kernel[[n - 1, n - 1]], profile[0], epsilon = 1e-12);

    // support is a disk of radius N-1 around the origin
    let origin = (n - 1) as f64;
    for ((i, j), &value) in kernel.indexed_iter() {
        let radius = ((i as f64 - origin).powi(2) + (j as f64 - origin).powi(2)).sqrt();
        if radius > origin {
            assert_eq!(value, 0.0, "cell ({}, {}) outside the disk must be zero", i, j);
        }
    }
}

#[test]
fn test_fresnel_lookup_exact_and_between() {
    let source = default_source();
    let table = FresnelTable::parse(&source.fresnel_pairs().expect("pairs")).expect("parse");

    let at_30 = table.coefficient_for(30.0);
    let at_35 = table.coefficient_for(35.0);
    let between = table.coefficient_for(32.0);
    assert!(between > at_30.min(at_35) && between < at_30.max(at_35));

    // exact tabulated angle returns the tabulated value unmodified
    let again = table.coefficient_for(30.0);
    assert_eq!(at_30.to_bits(), again.to_bits());
}

#[test]
fn test_malformed_tables_are_rejected() {
    assert!(FresnelTable::parse("0.0 0.02 extra\n").is_err());
    assert!(FresnelTable::parse("0.0 zero\n10.0 0.03\n").is_err());
    assert!(FresnelTable::parse("10.0 0.03\n0.0 0.02\n").is_err());
    assert!(FourierTable::parse(0, "0.85 1.0 2.0").is_err());
    assert!(FourierTable::parse(0, "").is_err());
}

#[test]
fn test_transmittance_stays_in_unit_interval() {
    let source = default_source();
    let cache = FourierTableCache::new();
    let table = cache.get(1, &source).expect("model 1");

    for sun in [0.0, 20.0, 45.0, 70.0] {
        for view in [0.0, 15.0, 60.0] {
            for tau in [0.05, 0.2, 0.8] {
                let t = table.transmittance(sun, view, tau);
                assert!(t > 0.0 && t <= 1.0, "t({}, {}, {}) = {}", sun, view, tau, t);
            }
        }
    }
}
