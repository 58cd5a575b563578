//! Throwaway Postgres databases and canned geocoder payloads for GuideFinder tests.

pub mod geocode;

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor, PgPool,
	postgres::{PgConnectOptions, PgConnection, PgPoolOptions},
};
use tokio::runtime::Builder;
use uuid::Uuid;

const DSN_ENV: &str = "GF_PG_DSN";
const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];
/// Nothing listens here, so a lazy pool on it fails on first use.
const OFFLINE_DSN: &str = "postgres://gf:gf@127.0.0.1:1/gf_offline";

/// A uniquely named database created next to the one in `GF_PG_DSN` and dropped when the
/// test ends.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::InvalidDsn(err.to_string()))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("gf_test_{}", Uuid::new_v4().simple());

		admin_conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await.map_err(
			|err| Error::Admin { name: name.clone(), message: format!("create failed: {err}") },
		)?;

		let dsn = base_options.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, dropped: false })
	}

	/// `None` (with a note on stderr) when `GF_PG_DSN` is unset, so ignored tests skip cleanly.
	pub async fn from_env(test_name: &str) -> Result<Option<Self>> {
		let Some(base_dsn) = env_dsn() else {
			eprintln!("Skipping {test_name}; set {DSN_ENV} to run this test.");

			return Ok(None);
		};

		Ok(Some(Self::new(&base_dsn).await?))
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn connect(&self, max_connections: u32) -> Result<PgPool> {
		let pool = PgPoolOptions::new().max_connections(max_connections).connect(&self.dsn).await?;

		Ok(pool)
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.admin_options).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let admin_options = self.admin_options.clone();
		let cleanup = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Dropping {name} failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(drop_database(&name, &admin_options)) {
				eprintln!("{err}");
			}
		});
		let _ = cleanup.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// A pool that never connects. Suits tests whose requests must be rejected before storage.
pub fn offline_pool() -> Result<PgPool> {
	Ok(PgPoolOptions::new().max_connections(1).connect_lazy(OFFLINE_DSN)?)
}

pub fn offline_dsn() -> &'static str {
	OFFLINE_DSN
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Admin {
		name: ADMIN_DATABASES.join("|"),
		message: format!("no admin database reachable: {last_err:?}"),
	})
}

async fn drop_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let admin_err = |message: String| Error::Admin { name: name.to_string(), message };
	let mut conn = PgConnection::connect_with(admin_options)
		.await
		.map_err(|err| admin_err(format!("admin connection failed: {err}")))?;

	// Pools in the test may still hold sessions.
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{name}""#))
		.execute(&mut conn)
		.await
		.map_err(|err| admin_err(format!("drop failed: {err}")))?;

	Ok(())
}
