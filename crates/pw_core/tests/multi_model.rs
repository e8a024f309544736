use pw_core::db::open_db_in_memory;
use pw_core::validator;
use pw_core::{
    FieldSource, FieldSpec, MemoryOptionRepository, ModelError, MultiModel, OptionMap,
    OptionRepository, OptionSchema, SqliteOptionRepository, ValidationRule, NEW_INSTANCE,
};
use serde_json::{json, Value};

struct MenuSchema;

impl OptionSchema for MenuSchema {
    fn name(&self) -> &str {
        "menus"
    }

    fn title(&self) -> &str {
        "Menus"
    }

    fn singular_title(&self) -> &str {
        "Menu"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("slug").label("Slug"),
            FieldSpec::new("depth").label("Depth").default_value("1"),
        ]
    }

    fn rules(&self) -> Vec<ValidationRule> {
        vec![ValidationRule::new("slug", validator::required)]
    }
}

fn map(value: Value) -> OptionMap {
    value.as_object().cloned().unwrap()
}

#[test]
fn load_creates_template_only_option() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOptionRepository::new(&conn);

    let model = MultiModel::load(MenuSchema, &repo).unwrap();

    assert_eq!(model.instance(), NEW_INSTANCE);
    assert!(model.is_new());
    assert_eq!(model.option().instance_ids().count(), 0);
    assert_eq!(
        repo.get_option("menus").unwrap(),
        Some(json!({"0": {"slug": "", "depth": "1"}, "auto_id": 1}))
    );
}

#[test]
fn saving_template_allocates_sequential_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOptionRepository::new(&conn);
    let mut model = MultiModel::load(MenuSchema, &repo).unwrap();

    let first = model
        .save(&repo, &map(json!({"slug": "main"})), NEW_INSTANCE)
        .unwrap();
    let second = model
        .save(&repo, &map(json!({"slug": "footer", "depth": "2"})), NEW_INSTANCE)
        .unwrap();

    assert_eq!(first, Some(1));
    assert_eq!(second, Some(2));
    assert_eq!(
        repo.get_option("menus").unwrap(),
        Some(json!({
            "0": {"slug": "", "depth": "1"},
            "1": {"slug": "main", "depth": "1"},
            "2": {"slug": "footer", "depth": "2"},
            "auto_id": 3
        }))
    );
}

#[test]
fn updating_existing_instance_keeps_id_and_auto_id() {
    let repo = MemoryOptionRepository::new();
    let mut model = MultiModel::load(MenuSchema, &repo).unwrap();
    model
        .save(&repo, &map(json!({"slug": "main"})), NEW_INSTANCE)
        .unwrap();

    let saved = model
        .save(&repo, &map(json!({"slug": "primary"})), 1)
        .unwrap();

    assert_eq!(saved, Some(1));
    assert_eq!(model.option().auto_id, 2);
    assert_eq!(model.instance_label(1), "primary");
}

#[test]
fn invalid_instance_is_not_written() {
    let repo = MemoryOptionRepository::new();
    let mut model = MultiModel::load(MenuSchema, &repo).unwrap();
    let before = repo.get_option("menus").unwrap();

    let saved = model
        .save(&repo, &map(json!({"slug": ""})), NEW_INSTANCE)
        .unwrap();

    assert_eq!(saved, None);
    assert_eq!(
        model.error("slug"),
        Some("The slug field is required.")
    );
    assert_eq!(repo.get_option("menus").unwrap(), before);
}

#[test]
fn saving_unknown_instance_is_an_error() {
    let repo = MemoryOptionRepository::new();
    let mut model = MultiModel::load(MenuSchema, &repo).unwrap();

    let err = model
        .save(&repo, &map(json!({"slug": "x"})), 9)
        .unwrap_err();
    assert!(matches!(err, ModelError::UnknownInstance(9)));
}

#[test]
fn delete_removes_instance_and_protects_template() {
    let repo = MemoryOptionRepository::new();
    let mut model = MultiModel::load(MenuSchema, &repo).unwrap();
    model
        .save(&repo, &map(json!({"slug": "main"})), NEW_INSTANCE)
        .unwrap();
    model.set_instance(1).unwrap();

    model.delete_instance(&repo, 1).unwrap();

    assert!(model.is_new());
    assert!(model.instance_option(1).is_none());
    assert_eq!(
        repo.get_option("menus").unwrap(),
        Some(json!({"0": {"slug": "", "depth": "1"}, "auto_id": 2}))
    );
    assert!(matches!(
        model.delete_instance(&repo, NEW_INSTANCE),
        Err(ModelError::ProtectedInstance)
    ));
    assert!(matches!(
        model.set_instance(1),
        Err(ModelError::UnknownInstance(1))
    ));
}

#[test]
fn load_repairs_auto_id_and_merges_instances() {
    let repo = MemoryOptionRepository::new();
    repo.add_option(
        "menus",
        &json!({"3": {"slug": "side", "stale": true}, "junk": 5, "auto_id": 2}),
        true,
    )
    .unwrap();

    let model = MultiModel::load(MenuSchema, &repo).unwrap();

    assert_eq!(model.option().auto_id, 4);
    assert_eq!(model.option().instance_ids().collect::<Vec<_>>(), vec![3]);
    assert_eq!(
        model.instance_option(3),
        Some(&map(json!({"slug": "side", "depth": "1"})))
    );
    assert_eq!(model.instance_option(NEW_INSTANCE), Some(&MenuSchema.defaults()));
}

#[test]
fn field_values_prefer_input_over_current_instance() {
    let repo = MemoryOptionRepository::new();
    let mut model = MultiModel::load(MenuSchema, &repo).unwrap();
    model
        .save(&repo, &map(json!({"slug": "main", "depth": "3"})), NEW_INSTANCE)
        .unwrap();
    model.set_instance(1).unwrap();
    model.input = map(json!({"slug": "typed"}));

    assert_eq!(model.field_value("slug"), Some(&json!("typed")));
    assert_eq!(model.field_value("depth"), Some(&json!("3")));
    assert_eq!(model.instance_label(2), "#2");
    assert_eq!(model.singular_title(), "Menu");
}

#[test]
fn largest_instance_id_is_skipped_on_load() {
    let repo = MemoryOptionRepository::new();
    repo.add_option(
        "menus",
        &json!({"18446744073709551615": {"slug": "x"}, "4": {"slug": "kept"}}),
        true,
    )
    .unwrap();

    let model = MultiModel::load(MenuSchema, &repo).unwrap();

    assert!(model.instance_option(u64::MAX).is_none());
    assert_eq!(model.instance_label(4), "kept");
    assert_eq!(model.option().auto_id, 5);
}

#[test]
fn exhausted_auto_id_refuses_new_instances() {
    let repo = MemoryOptionRepository::new();
    repo.add_option("menus", &json!({"auto_id": u64::MAX}), true)
        .unwrap();
    let mut model = MultiModel::load(MenuSchema, &repo).unwrap();

    let err = model
        .save(&repo, &map(json!({"slug": "main"})), NEW_INSTANCE)
        .unwrap_err();

    assert!(matches!(err, ModelError::InstanceIdsExhausted(name) if name == "menus"));
    assert_eq!(
        repo.get_option("menus").unwrap(),
        Some(json!({"auto_id": u64::MAX}))
    );
    assert_eq!(model.option().instance_ids().count(), 0);
}
