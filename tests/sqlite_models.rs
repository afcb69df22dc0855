#![cfg(feature = "sqlite")]
use sql_record::prelude::*;
use tokio::runtime::Runtime;

struct User;

impl Model for User {
    const TABLE: &'static str = "users";
    const FILLABLE: &'static [&'static str] = &["name", "email", "age"];
    const HIDDEN: &'static [&'static str] = &["password"];
}

struct Locked;

impl Model for Locked {
    const TABLE: &'static str = "users";
}

const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        email TEXT,
        age INTEGER,
        role TEXT DEFAULT 'member',
        password TEXT
    );
";

async fn setup() -> Result<Database, SqlRecordError> {
    let db = Database::sqlite(":memory:");
    db.execute_batch(SCHEMA).await?;
    Ok(db)
}

#[test]
fn create_persists_only_fillable_attributes() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = setup().await?;

        let ana = User::create(
            &db,
            [
                ("name", RowValues::from("Ana")),
                ("email", "a@x.com".into()),
                ("role", "admin".into()),
            ],
        )
        .await?;
        assert_eq!(ana.state(), RecordState::Persisted);
        assert!(ana.get("role").is_none());
        let id = ana.id().expect("id assigned on insert");

        let found = User::find(&db, id).await?.expect("row exists");
        assert_eq!(found.get("name"), Some(&RowValues::Text("Ana".into())));
        assert_eq!(found.get("email"), Some(&RowValues::Text("a@x.com".into())));
        // column default, not the dropped value
        assert_eq!(found.get("role"), Some(&RowValues::Text("member".into())));
        assert_eq!(found.get("id"), Some(&RowValues::Int(id)));

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn find_missing_id() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = setup().await?;

        assert!(User::find(&db, 999).await?.is_none());
        let err = User::find_or_fail(&db, 999).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Model not found with ID 999");

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn save_inserts_once_then_updates() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = setup().await?;

        let mut bo = Record::<User>::new([("name", RowValues::from("Bo")), ("age", 20.into())]);
        assert_eq!(bo.state(), RecordState::Transient);
        assert!(bo.is_dirty());

        bo.save(&db).await?;
        let id = bo.id().expect("id assigned");
        assert_eq!(bo.original().get("id"), Some(&RowValues::Int(id)));
        assert!(!bo.is_dirty());

        bo.set("age", 21);
        assert!(bo.is_dirty());
        bo.save(&db).await?;

        assert_eq!(db.table("users").count().await?, 1);
        let stored = User::find_or_fail(&db, id).await?;
        assert_eq!(stored.get("age"), Some(&RowValues::Int(21)));
        assert_eq!(bo.id(), Some(id));

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn delete_clears_the_record() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = setup().await?;

        let mut transient = Record::<User>::new([("name", "Cy")]);
        assert!(transient.delete(&db).await.unwrap_err().is_usage());

        let mut cy = User::create(&db, [("name", "Cy")]).await?;
        let id = cy.id().expect("id");
        assert!(cy.delete(&db).await?);
        assert_eq!(cy.state(), RecordState::Deleted);
        assert!(cy.attributes().is_empty());
        assert!(User::find(&db, id).await?.is_none());

        assert!(cy.save(&db).await.unwrap_err().is_usage());
        assert!(cy.delete(&db).await.unwrap_err().is_usage());

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn update_attributes_respects_fillable() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = setup().await?;

        let mut di = User::create(&db, [("name", "Di")]).await?;
        let id = di.id().expect("id");

        let changed = di
            .update_attributes(
                &db,
                [("email", RowValues::from("d@x.com")), ("role", "admin".into())],
            )
            .await?;
        assert!(changed);
        assert!(di.get("role").is_none());
        assert!(!di.is_dirty());

        let stored = User::find_or_fail(&db, id).await?;
        assert_eq!(stored.get("email"), Some(&RowValues::Text("d@x.com".into())));
        assert_eq!(stored.get("role"), Some(&RowValues::Text("member".into())));

        assert!(!di.update_attributes(&db, [("role", "root")]).await?);

        let mut fresh = Record::<User>::new([("name", "x")]);
        assert!(fresh.update_attributes(&db, [("name", "y")]).await.unwrap_err().is_usage());

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn hidden_attributes_stay_out_of_exports() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = setup().await?;
        db.raw(
            "INSERT INTO users (name, password) VALUES (:name, :password)",
            RawParams::named([("name", "Ed"), ("password", "hunter2")]),
        )
        .await?;

        let ed = User::filter(&db, "name", "=", "Ed")
            .first()
            .await?
            .expect("seeded");
        // hydration bypasses the policy
        assert_eq!(ed.get("password"), Some(&RowValues::Text("hunter2".into())));
        assert!(!ed.to_array().contains_key("password"));

        let json: serde_json::Value = serde_json::from_str(&ed.to_json())?;
        assert_eq!(json["name"], "Ed");
        assert!(json.get("password").is_none());

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn default_policy_only_allows_id() -> Result<(), Box<dyn std::error::Error>> {
    let mut locked = Record::<Locked>::new([("id", RowValues::Int(5)), ("name", "x".into())]);
    assert_eq!(locked.get("id"), Some(&RowValues::Int(5)));
    assert!(locked.get("name").is_none());
    assert!(!locked.set("email", "e"));

    let mut user = Record::<User>::new([("name", "ok")]);
    assert!(!user.set("password", "nope"));
    assert!(user.get("password").is_none());
    Ok(())
}

#[test]
fn static_entry_points() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = setup().await?;
        for (name, age) in [("Ana", 30), ("Bo", 17), ("Cy", 45)] {
            User::create(&db, [("name", RowValues::from(name)), ("age", age.into())]).await?;
        }

        assert_eq!(User::all(&db).await?.len(), 3);
        assert_eq!(User::pluck(&db, "name").await?.len(), 3);

        let oldest = User::order_by(&db, "age", Direction::Desc)
            .first()
            .await?
            .expect("rows");
        assert_eq!(oldest.get("name"), Some(&RowValues::Text("Cy".into())));

        let two = User::limit(&db, 2).get().await?;
        assert_eq!(two.len(), 2);

        let names = User::select(&db, ["name"])
            .filter("age", ">=", 18)
            .order_by("name", Direction::Asc)
            .get()
            .await?;
        assert_eq!(names.len(), 2);
        assert!(names[0].get("age").is_none());

        let groups = User::having(&db, "COUNT(*)", ">", 1)
            .select(["role", "COUNT(*) AS n"])
            .group_by("role")
            .get()
            .await?;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].get("n"), Some(&RowValues::Int(3)));

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn save_keeps_the_row_it_was_loaded_from() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = setup().await?;
        let one = User::create(&db, [("name", "one")]).await?.id().expect("id");
        let two = User::create(&db, [("name", "two")]).await?.id().expect("id");

        let mut record = User::find_or_fail(&db, one).await?;
        assert!(record.set("id", two));
        record.set("name", "renamed");
        record.save(&db).await?;

        assert_eq!(record.id(), Some(one));
        assert_eq!(record.original().get("id"), Some(&RowValues::Int(one)));
        let stored_one = User::find_or_fail(&db, one).await?;
        assert_eq!(stored_one.get("name"), Some(&RowValues::Text("renamed".into())));
        let stored_two = User::find_or_fail(&db, two).await?;
        assert_eq!(stored_two.get("name"), Some(&RowValues::Text("two".into())));

        assert!(record.delete(&db).await?);
        assert!(User::find(&db, one).await?.is_none());
        assert!(User::find(&db, two).await?.is_some());

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}
