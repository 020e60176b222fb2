use super::*;

fn has_error(result: &ValidationResult, path: &str) -> bool {
    result.errors.iter().any(|e| e.path == path)
}

fn has_warning(result: &ValidationResult, path: &str) -> bool {
    result.warnings.iter().any(|w| w.path == path)
}

#[test]
fn test_default_config_is_valid() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_empty_model_is_error() {
    let mut config = Config::default();
    config.generation.model = "  ".to_string();
    let result = ConfigValidator::validate(&config);
    assert!(has_error(&result, "generation.model"));
}

#[test]
fn test_zero_beam_size_is_error() {
    let mut config = Config::default();
    config.generation.beam_size = 0;
    let result = ConfigValidator::validate(&config);
    assert!(has_error(&result, "generation.beam_size"));
}

#[test]
fn test_zero_top_k_is_error() {
    let mut config = Config::default();
    config.generation.top_k = 0;
    assert!(has_error(&ConfigValidator::validate(&config), "generation.top_k"));
}

#[test]
fn test_top_p_range() {
    let mut config = Config::default();
    for bad in [0.0, -0.5, 1.5] {
        config.generation.top_p = bad;
        assert!(has_error(&ConfigValidator::validate(&config), "generation.top_p"));
    }
    config.generation.top_p = 1.0;
    assert!(ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_bad_browser_endpoint() {
    let mut config = Config::default();
    config.browser.endpoint = "localhost:9222".to_string();
    assert!(has_error(&ConfigValidator::validate(&config), "browser.endpoint"));
}

#[test]
fn test_bad_ollama_url() {
    let mut config = Config::default();
    config.ollama.base_url = "ftp://localhost".to_string();
    assert!(has_error(&ConfigValidator::validate(&config), "ollama.base_url"));
}

#[test]
fn test_beam_on_ollama_warns() {
    let mut config = Config::default();
    config.generation.decoding_strategy = DecodingStrategy::Beam;
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(has_warning(&result, "generation.decoding_strategy"));
}

#[test]
fn test_local_without_model_path_warns() {
    let mut config = Config::default();
    config.generation.backend = BackendKind::Local;
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(has_warning(&result, "local.model_path"));
    assert!(has_warning(&result, "local.tokenizer_path"));
}

#[test]
fn test_large_markup_cap_warns() {
    let mut config = Config::default();
    config.prompt.max_markup_chars = 100_000;
    assert!(has_warning(&ConfigValidator::validate(&config), "prompt.max_markup_chars"));
}

#[test]
fn test_into_result() {
    let mut config = Config::default();
    config.generation.top_k = 0;
    let err = ConfigValidator::validate(&config).into_result().unwrap_err();
    assert!(err.to_string().contains("generation.top_k"));

    let warnings = ConfigValidator::validate(&Config::default())
        .into_result()
        .unwrap();
    assert!(warnings.is_empty());
}
