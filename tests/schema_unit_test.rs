//! Unit tests for the schema model and its loaders.

use std::fs;
use table_sectioner::config::AdditionalForeignKeyConfig;
use table_sectioner::error::ConfigError;
use table_sectioner::schema::{
    inject_additional_foreign_keys, load_schema, ForeignKey, Schema, SchemaBuilder, SchemaGraph,
    TableId, TableSchema,
};
use tempfile::TempDir;

mod mod_tests {
    use super::*;

    #[test]
    fn test_schema_table_lookup() {
        let mut schema = Schema::new();
        let id = schema.add_table(TableSchema::new("MEMBER".to_string(), TableId(0)));

        assert_eq!(schema.get_table_id("MEMBER"), Some(id));
        assert_eq!(schema.get_table_id("member"), Some(id)); // case-insensitive
        assert_eq!(schema.get_table_id("nonexistent"), None);
    }

    #[test]
    fn test_qualified_name() {
        let mut table = TableSchema::new("MEMBER".to_string(), TableId(0));
        assert_eq!(table.qualified_name(), "MEMBER");
        table.schema = Some("nextschema".to_string());
        assert_eq!(table.qualified_name(), "nextschema.MEMBER");
        assert_eq!(table.display_name(), "nextschema.MEMBER");
    }

    #[test]
    fn test_resolve_builds_referrers() {
        let mut schema = Schema::new();
        let member = schema.add_table(TableSchema::new("MEMBER".to_string(), TableId(0)));
        let mut login = TableSchema::new("MEMBER_LOGIN".to_string(), TableId(0));
        login.foreign_keys.push(ForeignKey::new("member"));
        let login = schema.add_table(login);
        let mut category = TableSchema::new("CATEGORY".to_string(), TableId(0));
        category.foreign_keys.push(ForeignKey::new("CATEGORY"));
        let category = schema.add_table(category);

        schema.resolve_foreign_keys();

        let fk = &schema.table(login).unwrap().foreign_keys[0];
        assert_eq!(fk.referenced_table_id, Some(member));
        assert_eq!(schema.table(member).unwrap().referrers, vec![login]);
        assert!(schema.table(category).unwrap().has_self_reference());
    }

    #[test]
    fn test_graph_drops_self_references() {
        let mut schema = Schema::new();
        let mut category = TableSchema::new("CATEGORY".to_string(), TableId(0));
        category.foreign_keys.push(ForeignKey::new("CATEGORY"));
        let category = schema.add_table(category);
        schema.resolve_foreign_keys();

        let graph = SchemaGraph::from_schema(&schema);

        assert!(graph.dependencies(category).is_empty());
        assert!(graph.referrers(category).is_empty());
        assert_eq!(graph.root_tables(), vec![category]);
    }

    #[test]
    fn test_case_insensitive_lookup_prefers_first_table() {
        let mut schema = Schema::new();
        let lower = schema.add_table(TableSchema::new("member".to_string(), TableId(0)));
        let upper = schema.add_table(TableSchema::new("MEMBER".to_string(), TableId(0)));

        assert_eq!(schema.get_table_id("MEMBER"), Some(upper));
        assert_eq!(schema.get_table_id("member"), Some(lower));
        for _ in 0..10 {
            assert_eq!(schema.get_table_id("Member"), Some(lower));
        }
    }

    #[test]
    fn test_pure_name_shared_by_two_schemas_is_ambiguous() {
        let mut schema = Schema::new();
        let mut alpha = TableSchema::new("MEMBER".to_string(), TableId(0));
        alpha.schema = Some("alpha".to_string());
        let alpha = schema.add_table(alpha);
        let mut beta = TableSchema::new("MEMBER".to_string(), TableId(0));
        beta.schema = Some("beta".to_string());
        let beta = schema.add_table(beta);

        assert_eq!(schema.get_table_id("alpha.MEMBER"), Some(alpha));
        assert_eq!(schema.get_table_id("BETA.member"), Some(beta));
        assert_eq!(schema.get_table_id("MEMBER"), None);
    }

    #[test]
    fn test_main_schema_table_owns_pure_name() {
        let mut schema = Schema::new();
        let mut other = TableSchema::new("MEMBER".to_string(), TableId(0));
        other.schema = Some("nextschema".to_string());
        schema.add_table(other);
        let main = schema.add_table(TableSchema::new("MEMBER".to_string(), TableId(0)));
        let mut purchase = TableSchema::new("PURCHASE".to_string(), TableId(0));
        purchase.foreign_keys.push(ForeignKey::new("MEMBER"));
        let purchase = schema.add_table(purchase);

        schema.resolve_foreign_keys();

        assert_eq!(schema.get_table_id("MEMBER"), Some(main));
        assert_eq!(
            schema.table(purchase).unwrap().foreign_keys[0].referenced_table_id,
            Some(main)
        );
    }

    #[test]
    fn test_foreign_key_flags() {
        let fk = ForeignKey::new("MEMBER_STATUS")
            .with_fixed_condition("$$foreignAlias$$.FLG = 1")
            .additional();
        assert!(fk.has_fixed_condition());
        assert!(fk.is_additional);
    }
}

mod ddl_tests {
    use super::*;

    #[test]
    fn test_parse_script_reads_foreign_keys() {
        let mut builder = SchemaBuilder::new();
        builder.parse_script(
            r#"
CREATE TABLE MEMBER (
  MEMBER_ID INT PRIMARY KEY,
  MEMBER_STATUS_CODE CHAR(3),
  CONSTRAINT FK_MEMBER_STATUS FOREIGN KEY (MEMBER_STATUS_CODE) REFERENCES MEMBER_STATUS(MEMBER_STATUS_CODE)
);
CREATE TABLE MEMBER_STATUS (
  MEMBER_STATUS_CODE CHAR(3) PRIMARY KEY,
  DESCRIPTION VARCHAR(200) DEFAULT 'a;b'
);
CREATE TABLE MEMBER_LOGIN (
  MEMBER_LOGIN_ID INT PRIMARY KEY,
  MEMBER_ID INT REFERENCES MEMBER(MEMBER_ID)
);
"#,
        );
        let schema = builder.build();

        assert_eq!(schema.len(), 3);
        let member = schema.get_table("MEMBER").unwrap();
        assert_eq!(member.foreign_keys.len(), 1);
        assert_eq!(member.foreign_keys[0].name.as_deref(), Some("FK_MEMBER_STATUS"));
        assert_eq!(member.foreign_keys[0].referenced_table, "MEMBER_STATUS");
        assert!(member.foreign_keys[0].referenced_table_id.is_some());

        let login = schema.get_table("MEMBER_LOGIN").unwrap();
        assert_eq!(login.foreign_keys.len(), 1);
        assert_eq!(login.foreign_keys[0].referenced_table, "MEMBER");
    }

    #[test]
    fn test_alter_table_adds_foreign_key() {
        let mut builder = SchemaBuilder::new();
        builder.parse_script(
            "CREATE TABLE `purchase` (`id` INT, `member_id` INT);\n\
             CREATE TABLE `member` (`id` INT);\n\
             ALTER TABLE `purchase` ADD CONSTRAINT `fk_purchase_member` FOREIGN KEY (`member_id`) REFERENCES `member` (`id`);",
        );
        let schema = builder.build();

        let purchase = schema.get_table("purchase").unwrap();
        assert_eq!(purchase.foreign_keys.len(), 1);
        assert_eq!(
            purchase.foreign_keys[0].referenced_table_id,
            schema.get_table_id("member")
        );
    }
}

mod qualified_ddl_tests {
    use super::*;

    #[test]
    fn test_same_table_in_two_schemas_kept() {
        let mut builder = SchemaBuilder::new();
        builder.parse_script(
            "CREATE TABLE alpha.MEMBER (id INT); CREATE TABLE beta.MEMBER (id INT);",
        );
        let schema = builder.build();

        assert_eq!(schema.len(), 2);
        let names: Vec<String> = schema.iter().map(|t| t.qualified_name()).collect();
        assert_eq!(names, vec!["alpha.MEMBER", "beta.MEMBER"]);
    }

    #[test]
    fn test_repeated_create_is_deduplicated() {
        let mut builder = SchemaBuilder::new();
        builder.parse_script(
            "CREATE TABLE alpha.MEMBER (id INT); CREATE TABLE ALPHA.member (id INT); CREATE TABLE MEMBER (id INT);",
        );
        let schema = builder.build();

        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_alter_table_targets_qualified_table() {
        let mut builder = SchemaBuilder::new();
        builder.parse_script(
            "CREATE TABLE alpha.PURCHASE (id INT, member_id INT);\n\
             CREATE TABLE beta.PURCHASE (id INT, member_id INT);\n\
             CREATE TABLE MEMBER (id INT);\n\
             ALTER TABLE beta.PURCHASE ADD CONSTRAINT fk_purchase_member FOREIGN KEY (member_id) REFERENCES MEMBER (id);",
        );
        let schema = builder.build();

        assert!(schema.get_table("alpha.PURCHASE").unwrap().foreign_keys.is_empty());
        let beta = schema.get_table("beta.PURCHASE").unwrap();
        assert_eq!(beta.foreign_keys.len(), 1);
        assert_eq!(
            beta.foreign_keys[0].referenced_table_id,
            schema.get_table_id("MEMBER")
        );
    }
}

mod loader_tests {
    use super::*;

    fn additional(table: &str, referenced: &str) -> AdditionalForeignKeyConfig {
        AdditionalForeignKeyConfig {
            table: table.to_string(),
            referenced_table: referenced.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_yaml_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.yaml");
        fs::write(
            &path,
            r#"
tables:
  - name: MEMBER
    foreign_keys:
      - references: MEMBER_STATUS
        fixed_condition: "$$foreignAlias$$.DISPLAY_ORDER = 1"
  - name: MEMBER_STATUS
  - name: PURCHASE
    schema: nextschema
    foreign_keys:
      - references: MEMBER
"#,
        )
        .unwrap();

        let schema = load_schema(&path, &[additional("PURCHASE", "MEMBER_STATUS")]).unwrap();

        assert_eq!(schema.len(), 3);
        let member = schema.get_table("MEMBER").unwrap();
        assert!(member.foreign_keys[0].has_fixed_condition());

        let purchase = schema.get_table("nextschema.PURCHASE").unwrap();
        assert_eq!(purchase.foreign_keys.len(), 2);
        assert!(purchase.foreign_keys[1].is_additional);
        assert_eq!(
            purchase.foreign_keys[1].referenced_table_id,
            schema.get_table_id("MEMBER_STATUS")
        );
    }

    #[test]
    fn test_load_sql_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.sql");
        fs::write(&path, "CREATE TABLE MEMBER (MEMBER_ID INT);").unwrap();

        let schema = load_schema(&path, &[]).unwrap();
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_additional_fk_to_unknown_table_rejected() {
        let mut schema = Schema::new();
        schema.add_table(TableSchema::new("MEMBER".to_string(), TableId(0)));

        let err = inject_additional_foreign_keys(&mut schema, &[additional("MEMBER", "GHOST")])
            .unwrap_err();

        match err {
            ConfigError::UnknownTable { missing, .. } => assert_eq!(missing, "GHOST"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_schema_file() {
        let dir = TempDir::new().unwrap();
        let err = load_schema(&dir.path().join("nope.yaml"), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
