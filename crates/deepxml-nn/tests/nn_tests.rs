// Integration tests for deepxml-nn: layers, config parsing, Transform

use deepxml_core::{Device, Error, Repr, SparseBatch, Tensor};
use deepxml_nn::{
    build_layers, BatchNorm1d, Dropout, Layer, Linear, Module, Residual, ResidualInit,
    Sequential, Transform, TransformConfig,
};
use serde_json::json;

fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() < tol
}

fn assert_vec_approx(got: &[f32], expected: &[f32], tol: f32) {
    assert_eq!(got.len(), expected.len(), "length mismatch");
    for (i, (g, e)) in got.iter().zip(expected).enumerate() {
        assert!(approx_eq(*g, *e, tol), "index {i}: got {g} expected {e}");
    }
}

fn t(rows: usize, cols: usize, data: &[f32]) -> Tensor {
    Tensor::from_vec(data.to_vec(), (rows, cols)).unwrap()
}

// Layers

#[test]
fn test_linear_shape_and_values() {
    let linear = Linear::new(10, 5, true);
    assert_eq!(linear.weight().dims(), (5, 10));
    assert_eq!(linear.bias().unwrap().dims(), (1, 5));
    assert_eq!(linear.forward(&Tensor::ones((3, 10))).unwrap().dims(), (3, 5));

    let w = t(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    let b = t(1, 2, &[0.5, -0.5]);
    let linear = Linear::from_tensors(w, Some(b)).unwrap();
    let y = linear.forward(&t(1, 2, &[1.0, 1.0])).unwrap();
    assert_eq!(y.to_vec(), vec![3.5, 6.5]);
    assert_eq!(linear.num_parameters(), 6);
}

#[test]
fn test_linear_rejects_mismatched_input() {
    let linear = Linear::new(4, 2, false);
    assert!(linear.bias().is_none());
    assert!(linear.forward(&Tensor::ones((1, 3))).is_err());
}

#[test]
fn test_batchnorm_training_normalizes_columns() {
    let bn = BatchNorm1d::new(2, 1e-5, 0.1);
    let x = t(4, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0]);
    let y = bn.forward(&x).unwrap();
    let mean = y.column_mean();
    let var = y.column_var();
    assert_vec_approx(mean.as_slice().unwrap(), &[0.0, 0.0], 1e-5);
    assert_vec_approx(var.as_slice().unwrap(), &[1.0, 1.0], 1e-3);
    // running_mean = 0.9 * 0 + 0.1 * batch_mean
    assert_vec_approx(bn.running_mean().as_slice().unwrap(), &[0.25, 2.5], 1e-5);
}

#[test]
fn test_batchnorm_eval_uses_running_stats() {
    let bn = BatchNorm1d::new(2, 0.0, 0.1);
    bn.eval();
    let x = t(1, 2, &[3.0, -1.0]);
    assert_eq!(bn.forward(&x).unwrap().to_vec(), vec![3.0, -1.0]);
}

#[test]
fn test_batchnorm_single_row_fails_in_training() {
    let bn = BatchNorm1d::new(3, 1e-5, 0.1);
    assert!(bn.forward(&Tensor::ones((1, 3))).is_err());
    assert!(bn.forward(&Tensor::ones((2, 4))).is_err());
}

#[test]
fn test_dropout_modes() {
    let d = Dropout::new(0.5).unwrap();
    let x = Tensor::ones((50, 40));
    let y = d.forward(&x).unwrap();
    let zeros = y.to_vec().iter().filter(|&&v| v == 0.0).count();
    assert!(zeros > 0 && zeros < 2000);
    assert!(y.to_vec().iter().all(|&v| v == 0.0 || approx_eq(v, 2.0, 1e-6)));

    d.eval();
    assert_eq!(d.forward(&x).unwrap(), x);
    assert!(Dropout::new(1.0).is_err());
    assert!(Dropout::new(-0.1).is_err());
}

#[test]
fn test_residual_eye_init_pads_skip_path() {
    let block = Residual::new(3, 5, 0.5, ResidualInit::Eye).unwrap();
    block.eval();
    let y = block.forward(&t(1, 3, &[1.0, -2.0, 3.0])).unwrap();
    assert_eq!(y.dims(), (1, 5));
    let s = 1.0 / (1.0f32 + 1e-5).sqrt();
    assert_vec_approx(&y.to_vec(), &[1.0 + s, -2.0, 3.0 + 3.0 * s, 0.0, 0.0], 1e-4);
}

#[test]
fn test_residual_random_init_uses_relu_gain() {
    let block = Residual::new(50, 60, 0.0, ResidualInit::Random).unwrap();
    let bound = (2.0f32 * 6.0 / 110.0).sqrt();
    let unit_gain_bound = (6.0f32 / 110.0).sqrt();
    let weights = block.linear().weight().to_vec();
    assert!(weights.iter().all(|w| w.abs() <= bound + 1e-6));
    assert!(weights.iter().any(|w| w.abs() > unit_gain_bound));
}

#[test]
fn test_residual_rejects_narrowing() {
    assert!(Residual::new(5, 3, 0.1, ResidualInit::Random).is_err());
}

// Config

#[test]
fn test_relu_then_dropout_pipeline() {
    let config = TransformConfig::from_json_str(
        r#"{"order": ["relu", "dropout"], "relu": {}, "dropout": {"p": 0.1}}"#,
    )
    .unwrap();
    let transform = Transform::from_config(&config, Device::Cpu).unwrap();
    assert_eq!(transform.len(), 2);
    assert!(!transform.is_single());
    assert_eq!(transform.stage_names(), vec!["relu", "dropout"]);

    let x = t(2, 3, &[-1.0, 2.0, -3.0, 4.0, -5.0, 6.0]);
    let y = transform.forward(Repr::Dense(x.clone())).unwrap();
    let y = y.as_dense().unwrap();
    for (got, input) in y.to_vec().iter().zip(x.to_vec()) {
        let relu = input.max(0.0);
        assert!(*got == 0.0 || approx_eq(*got, relu / 0.9, 1e-5), "got {got} for {input}");
    }

    transform.eval();
    let y = transform.forward(Repr::Dense(x)).unwrap();
    assert_eq!(y.as_dense().unwrap().to_vec(), vec![0.0, 2.0, 0.0, 4.0, 0.0, 6.0]);
}

#[test]
fn test_unknown_layer_is_fatal() {
    let config = TransformConfig::new().stage("conv9d", json!({}));
    assert!(matches!(build_layers(&config), Err(Error::UnknownLayer(t)) if t == "conv9d"));
}

#[test]
fn test_missing_or_bad_params_are_fatal() {
    let config = TransformConfig::from_json_str(r#"{"order": ["dropout"]}"#).unwrap();
    assert!(matches!(build_layers(&config), Err(Error::InvalidConfig(_))));

    let config = TransformConfig::new().stage("dropout", json!({"prob": 0.1}));
    assert!(matches!(build_layers(&config), Err(Error::InvalidConfig(_))));

    let config = TransformConfig::new().stage("linear", json!({"in_features": 3}));
    assert!(matches!(build_layers(&config), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_defaults_fill_missing_params() {
    let config = TransformConfig::new()
        .stage("residual", json!({"input_size": 4, "output_size": 4}))
        .stage("dropout", json!({}));
    let layers = build_layers(&config).unwrap();
    assert_eq!(layers.len(), 2);
    match &layers[1] {
        Layer::Dropout(d) => assert_eq!(d.p(), 0.5),
        other => panic!("expected dropout, got {other:?}"),
    }
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transform.json");
    let config = TransformConfig::new()
        .stage("identity", json!({}))
        .stage("linear", json!({"in_features": 2, "out_features": 2}));
    std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
    assert_eq!(TransformConfig::from_file(&path).unwrap(), config);
}

// Transform

#[test]
fn test_single_stage_matches_sequential_path() {
    let linear = Linear::from_tensors(t(2, 3, &[1.0, 0.0, 2.0, -1.0, 1.0, 0.5]), None).unwrap();
    let single = Transform::new(vec![Layer::Linear(linear.clone())], Device::Cpu).unwrap();
    assert!(single.is_single());
    let wrapped = Sequential::new(vec![Layer::Linear(linear)]);

    let x = Repr::Dense(t(2, 3, &[1.0, 2.0, 3.0, -1.0, 0.0, 4.0]));
    assert_eq!(single.forward(x.clone()).unwrap(), wrapped.forward(x).unwrap());
}

#[test]
fn test_empty_transform_is_rejected() {
    assert!(Transform::new(vec![], Device::Cpu).is_err());
}

#[test]
fn test_initialize_and_capabilities_without_support() {
    let config = TransformConfig::new()
        .stage("relu", json!({}))
        .stage("identity", json!({}));
    let mut transform = Transform::from_config(&config, Device::Cpu).unwrap();
    transform.initialize(&Tensor::ones((3, 3))).unwrap();
    assert!(!transform.sparse());
    assert!(transform.token_embeddings().is_none());
}

#[test]
fn test_astec_first_stage_capabilities() {
    let config = TransformConfig::new().stage(
        "astec",
        json!({"vocabulary_dims": 4, "embedding_dims": 2, "dropout": 0.2}),
    );
    let mut transform = Transform::from_config(&config, Device::Cpu).unwrap();
    assert!(transform.sparse());

    let table = t(4, 2, &[0.0, 0.0, 1.0, 2.0, -4.0, 2.0, 0.5, 0.5]);
    transform.initialize(&table).unwrap();
    assert_eq!(transform.token_embeddings().unwrap(), &table);
    assert!(transform.initialize(&Tensor::ones((3, 2))).is_err());

    transform.eval();
    let batch = SparseBatch::from_rows(&[vec![(1, 1.0), (2, 0.5)], vec![(3, 2.0)]], 0);
    let y = transform.forward(Repr::Sparse(batch)).unwrap();
    // row 0: [1, 2] + 0.5 * [-4, 2] = [-1, 3] -> relu -> [0, 3]
    assert_eq!(y.as_dense().unwrap().to_vec(), vec![0.0, 3.0, 1.0, 1.0]);
}

#[test]
fn test_astec_mean_reduction_skips_padding() {
    let config = TransformConfig::new().stage(
        "astec",
        json!({"vocabulary_dims": 3, "embedding_dims": 1, "reduction": "mean", "sparse": false}),
    );
    let mut transform = Transform::from_config(&config, Device::Cpu).unwrap();
    assert!(!transform.sparse());
    transform.initialize(&t(3, 1, &[0.0, 2.0, 4.0])).unwrap();
    transform.eval();
    let batch = SparseBatch::from_rows(&[vec![(1, 1.0), (2, 1.0)], vec![(2, 1.0)]], 0);
    let y = transform.forward(Repr::Sparse(batch)).unwrap();
    assert_eq!(y.as_dense().unwrap().to_vec(), vec![3.0, 4.0]);
}

#[test]
fn test_strip_identity_drops_auxiliary_half() {
    let config = TransformConfig::new()
        .stage("_identity", json!({}))
        .stage("relu", json!({}));
    let transform = Transform::from_config(&config, Device::Cpu).unwrap();
    let aux = SparseBatch::from_rows(&[vec![(1, 1.0)]], 0);
    let x = Repr::pair(Repr::Dense(t(1, 2, &[-1.0, 1.0])), Repr::Sparse(aux));
    let y = transform.forward(x).unwrap();
    assert_eq!(y.as_dense().unwrap().to_vec(), vec![0.0, 1.0]);

    assert!(transform.forward(Repr::Dense(Tensor::ones((1, 2)))).is_err());
}

#[test]
fn test_dense_stage_rejects_sparse_input() {
    let config = TransformConfig::new().stage("relu", json!({}));
    let transform = Transform::from_config(&config, Device::Cpu).unwrap();
    let batch = SparseBatch::from_rows(&[vec![(0, 1.0)]], 0);
    assert!(transform.forward(Repr::Sparse(batch)).is_err());
}

#[test]
fn test_to_rebinds_every_parameter() {
    let config = TransformConfig::new()
        .stage("linear", json!({"in_features": 3, "out_features": 3}))
        .stage("residual", json!({"input_size": 3, "output_size": 4}));
    let mut transform = Transform::from_config(&config, Device::Cuda(0)).unwrap();
    assert!(transform.parameters().iter().all(|p| p.device() == Device::Cpu));
    transform.to();
    assert_eq!(transform.device(), Device::Cuda(0));
    assert!(transform.parameters().iter().all(|p| p.device() == Device::Cuda(0)));
    // linear (9 + 3) + residual linear (12 + 4) + batchnorm (4 + 4)
    assert_eq!(transform.num_parameters(), 36);
}
