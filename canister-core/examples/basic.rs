//! Basic example of the canister service container.

use std::sync::Arc;

use canister_core::container::Container;
use canister_core::error::Result;
use canister_core::id::ServiceId;
use canister_core::introspect::{Constructible, TypeDescriptor, TypeRegistration};

// === Define your types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct StdoutLogger;

impl Logger for StdoutLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Settings {
    database_url: String,
    pool_size: u32,
}

struct Database {
    url: String,
    pool_size: u32,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        format!("{} rows from {}", sql.len() % 7, self.url)
    }
}

impl Constructible for Database {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Database>()
            .depends_on::<Settings>("settings")
            .build_with(|args| {
                let settings: Arc<Settings> = args.next_arc()?;
                Ok(Database {
                    url: settings.database_url.clone(),
                    pool_size: settings.pool_size,
                })
            })
    }
}

// Registered at link time: any container using the default introspector
// can autowire a Database.
inventory::submit! { TypeRegistration::of::<Database>() }

struct UserRepository {
    db: Arc<Database>,
    logger: Arc<dyn Logger>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.logger.log(&format!("looking up user {id}"));
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

impl Constructible for UserRepository {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<UserRepository>()
            .depends_on::<Database>("db")
            .depends_on_id("logger", "logger")
            .build_with(|args| {
                Ok(UserRepository {
                    db: args.next_arc()?,
                    logger: args.next_value()?,
                })
            })
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("canister=debug")
        .init();

    let container = Container::builder()
        // Settings — explicit factory under the conventional type id
        .factory(ServiceId::of::<Settings>(), || Settings {
            database_url: "postgres://localhost/app".to_string(),
            pool_size: 8,
        })
        // Logger — factory under a plain string key
        .factory("logger", || Arc::new(StdoutLogger) as Arc<dyn Logger>)
        // Short name for the autowired database
        .alias("db", ServiceId::of::<Database>())
        // Registered for this container only
        .register_type::<UserRepository>()
        .build()?;

    println!("{container:?}");

    // Autowired: UserRepository -> Database -> Settings, plus the logger.
    let repo = container.resolve::<UserRepository>()?;
    println!("{}", repo.find_user(42));

    // The alias and the type id share one cached instance.
    let db = container.get_as::<Database>("db")?;
    println!("pool size: {}", db.pool_size);

    Ok(())
}
