//! Shared test utilities for serialising environment mutation.

use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;

use tokio::sync::{Mutex, MutexGuard};

use crate::defaults::{AlbDefaults, Fixtures};

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Defaults as documented, built without consulting the environment.
pub fn alb_defaults() -> AlbDefaults {
    AlbDefaults {
        target_group_prefix: String::from("tf-tg"),
        backend_group_prefix: String::from("tf-bg"),
        instance_prefix: String::from("tf-instance"),
        backend_group_description: String::from("alb-bg-description"),
        target_group_description: String::from("alb-tg-description"),
        tls_sni: String::from("tf-test-tls"),
        tls_validation_context: String::from("tf-test-validation-context"),
        backend_weight: 1,
        panic_threshold: 50,
        locality_percent: 35,
        strict_locality: None,
        timeout: String::from("300s"),
        interval: String::from("560s"),
        service_name: String::from("tf-test-service"),
        http2: None,
        host: String::from("tf-test-host"),
        path: String::from("tf-test-path"),
        port: 3,
        send: String::from("tf-test-send"),
        receive: String::from("tf-test-receive"),
        zone: String::from("ru-central1-a"),
        subnet_cidr: String::from("192.168.0.0/24"),
        image_family: String::from("ubuntu-1804-lts"),
        platform_id: String::from("standard-v2"),
        cores: 2,
        core_fraction: 20,
        memory_gb: 2,
        disk_size_gb: 4,
        preemptible: None,
    }
}

/// Validated fixtures for [`alb_defaults`].
pub fn fixtures() -> Fixtures {
    alb_defaults().fixtures().expect("documented defaults are valid")
}
