#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.llm.provider, BackendKind::OpenAi);
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.analysis.max_chunk_tokens, 15_000);
        assert_eq!(config.analysis.max_key_concepts, 12);
        assert!(config.analysis.generate_title);
        assert_eq!(config.pricing.input_per_million, 2.00);
        assert_eq!(config.pricing.output_per_million, 8.00);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = Config::from_toml_str(
            r#"
            [llm]
            provider = "ollama"
            model = "llama3:8b"
            base_url = "http://localhost:11434"

            [analysis]
            max_chunk_tokens = 8000
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.provider, BackendKind::Ollama);
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.llm.max_output_tokens, default_max_output_tokens());
        assert_eq!(config.analysis.max_chunk_tokens, 8000);
        assert_eq!(config.analysis.call_timeout_secs, 180);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(Config::from_toml_str("[llm]\nprovider = \"mystery\"").is_err());
    }

    #[test]
    fn test_api_key_falls_back_to_env() {
        let config = Config::default();
        let backend = config.backend_config_with(|name| {
            (name == "PAPERLENS_OPENAI_API_KEY").then(|| "sk-env".to_string())
        });
        assert_eq!(backend.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn test_ollama_reads_no_key_from_env() {
        let mut config = Config::default();
        config.llm.provider = BackendKind::Ollama;
        let backend = config.backend_config_with(|_| Some("should-not-be-read".to_string()));
        assert_eq!(backend.api_key, None);
    }

    #[test]
    fn test_file_api_key_wins_over_env() {
        let mut config = Config::default();
        config.llm.api_key = "sk-file".to_string();
        let backend = config.backend_config_with(|_| Some("sk-env".to_string()));
        assert_eq!(backend.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn test_analysis_config_mapping() {
        let mut config = Config::default();
        config.analysis.call_timeout_secs = 30;
        config.pricing.output_per_million = 10.0;
        let analysis = config.analysis_config();
        assert_eq!(analysis.chunker.max_tokens, 15_000);
        assert_eq!(analysis.call_timeout, Duration::from_secs(30));
        assert_eq!(analysis.pricing.output_per_million, 10.0);
        assert_eq!(analysis.max_key_concepts, 12);
    }
}
