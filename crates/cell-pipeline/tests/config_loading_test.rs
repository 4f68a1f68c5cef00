use anyhow::Result;
use cell_constraint::{ForbiddenWordProvider, PATTERN_MATCH_KEY, StaticWordProvider};
use cell_core::{CellContext, CellFailure, CellProcessor, Outcome, Value};
use cell_pipeline::{
    Components, ComponentFactory, Error, FailureReport, MappingLoader, MappingSet,
    MessageCatalog, MessageInterpolator, MessageResolver, Resources,
};
use std::io::Write;
use std::sync::Arc;

const LAYOUT: &str = r#"
fields:
  - name: code
    column: 1
    required: true
    trim: true
    pattern:
      regex: "[A-Za-z]{3}"
      description: three letters
    processors: [upper]
  - name: comment
    column: 2
    optional: true
    forbidden_words:
      provider: house
      words: [eggs]
"#;

#[derive(Debug)]
struct Upper;

impl CellProcessor for Upper {
    fn name(&self) -> &str {
        "Upper"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        match value {
            Value::Text(text) => Ok(Value::Text(text.to_uppercase())),
            other => Err(CellFailure::conversion("custom.Upper.violated", context).rejected(other)),
        }
    }
}

fn components() -> Components {
    let resources = Resources::new().with("banned", vec!["spam".to_string(), "ham".to_string()]);
    let components = Components {
        word_providers: ComponentFactory::with_resources(resources),
        processors: ComponentFactory::new(),
    };
    components.word_providers.register_constructed("house", |resources| {
        let banned = resources.require::<Vec<String>>("banned")?;
        let provider: Arc<dyn ForbiddenWordProvider> =
            Arc::new(StaticWordProvider::new().field("comment", banned.iter().cloned()));
        Ok(provider)
    });
    components.processors.register_managed("upper", Arc::new(Upper));
    components
}

#[test]
fn test_yaml_layout_with_components() -> Result<()> {
    let config = MappingLoader::from_yaml(LAYOUT)?;
    let mappings = MappingSet::from_config(&config, &components())?;

    let code = mappings.by_name("code").expect("code mapping");
    assert_eq!(
        code.decode_chain().describe(),
        "Trim -> Required -> PatternMatch -> Upper"
    );
    assert_eq!(mappings.decode_cell(1, Some(" abc "), 1)?, Value::text("ABC"));
    assert_eq!(mappings.encode_cell(1, Value::text("xyz"), 1)?.as_deref(), Some("XYZ"));

    let failure = mappings.decode_cell(1, Some("ab1"), 2).unwrap_err();
    assert_eq!(failure.message_key(), PATTERN_MATCH_KEY);
    assert_eq!(
        failure.variables().get("description"),
        Some(&Value::text("three letters"))
    );

    assert_eq!(mappings.decode_cell(2, Some(""), 1)?, Value::Null);
    assert!(mappings.decode_cell(2, Some("green eggs"), 1).is_err());
    assert!(mappings.decode_cell(2, Some("spam"), 1).is_err());
    assert!(mappings.decode_cell(2, Some("toast"), 1).is_ok());
    Ok(())
}

#[test]
fn test_unregistered_processor_names_field() -> Result<()> {
    let config = MappingLoader::from_yaml(LAYOUT)?;
    let err = MappingSet::from_config(&config, &Components::new()).unwrap_err();
    assert!(matches!(err, Error::Field { ref field, .. } if field == "code"));
    assert_eq!(err.to_string(), "Field 'code': Component 'upper' is not registered");
    Ok(())
}

#[test]
fn test_load_from_files() -> Result<()> {
    let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    yaml.write_all(LAYOUT.as_bytes())?;
    let config = MappingLoader::from_file(yaml.path())?;
    assert_eq!(config.fields.len(), 2);

    let mut json = tempfile::Builder::new().suffix(".json").tempfile()?;
    json.write_all(br#"{"fields": [{"name": "n", "column": 1, "kind": "short"}]}"#)?;
    let config = MappingLoader::from_file(json.path())?;
    assert_eq!(config.fields[0].name, "n");

    let mut broken = tempfile::Builder::new().suffix(".yml").tempfile()?;
    broken.write_all(b"fields: [")?;
    assert!(matches!(
        MappingLoader::from_file(broken.path()),
        Err(Error::InvalidFormat(_))
    ));
    Ok(())
}

#[test]
fn test_localized_messages() -> Result<()> {
    let config = MappingLoader::from_yaml(LAYOUT)?;
    let mappings = MappingSet::from_config(&config, &components())?;

    let mut catalog = MessageCatalog::english();
    catalog.merge_yaml(
        r#"
de:
  cell.constraint.PatternMatch.violated: "Zeile {rowNumber}: '{validatedValue}' passt nicht zu {description}."
  cell.constraint.Required.violated: "{label} fehlt."
"#,
    )?;
    let resolver: Arc<dyn MessageResolver> = Arc::new(catalog);
    let german = MessageInterpolator::new(Arc::clone(&resolver)).locale("de-AT");
    let english = MessageInterpolator::new(resolver);

    let failure = mappings.decode_cell(1, Some("a-b"), 4).unwrap_err();
    assert_eq!(
        german.render(&failure),
        "Zeile 4: 'a-b' passt nicht zu three letters."
    );
    assert_eq!(
        english.render(&failure),
        "'a-b' does not match the pattern '[A-Za-z]{3}'."
    );

    let missing = mappings.decode_cell(1, None, 5).unwrap_err();
    let report = FailureReport::new(&missing, &german);
    assert_eq!(report.message, "code fehlt.");
    assert_eq!(report.row, 5);
    Ok(())
}
