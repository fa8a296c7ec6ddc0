use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use enclave_keys::{
    digest, signer, AccessControlPolicy, KeyConfig, KeyError, KeyManager, PresenceOutcome,
    Protection, SecureKeyStore, Signer, SoftwareKeyStore, UserPresence,
};

/// Presence gate that always answers with one scripted outcome.
struct ScriptedPresence(PresenceOutcome);

impl UserPresence for ScriptedPresence {
    fn request_presence(&self, _reason: &str) -> PresenceOutcome {
        self.0
    }
}

/// Presence gate that parks inside the prompt until released, so a test can
/// observe the store while an authentication is pending.
struct ParkedPresence {
    state: Mutex<ParkedState>,
    cv: Condvar,
}

#[derive(Default)]
struct ParkedState {
    entered: bool,
    released: bool,
}

impl ParkedPresence {
    fn new() -> Self {
        Self {
            state: Mutex::new(ParkedState::default()),
            cv: Condvar::new(),
        }
    }

    fn wait_until_entered(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.entered {
            state = self.cv.wait(state).unwrap();
        }
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap();
        state.released = true;
        self.cv.notify_all();
    }
}

impl UserPresence for ParkedPresence {
    fn request_presence(&self, _reason: &str) -> PresenceOutcome {
        let mut state = self.state.lock().unwrap();
        state.entered = true;
        self.cv.notify_all();
        while !state.released {
            state = self.cv.wait(state).unwrap();
        }
        PresenceOutcome::Authenticated
    }
}

fn demo_config(label: &str) -> KeyConfig {
    let public_policy = AccessControlPolicy::new(Protection::AlwaysAvailable, false, true)
        .expect("valid public policy");
    let private_policy = AccessControlPolicy::new(Protection::AfterFirstUnlock, true, true)
        .expect("valid private policy");
    KeyConfig::new(label, public_policy, private_policy).expect("valid config")
}

#[test]
fn demo_scenario_sign_and_verify() {
    // Label "demo", private policy {AfterFirstUnlock, userPresence}: first
    // acquisition generates, signing "hello"'s digest verifies against the
    // key's own public half and nothing else.
    let store = Arc::new(SoftwareKeyStore::new());
    let manager = KeyManager::new(store.clone(), demo_config("demo"));
    let handle = manager.get_or_create_key_pair().expect("generate");
    let public_key = manager.public_key(&handle).expect("public key");
    assert_eq!(public_key.as_bytes()[0], 0x04);

    let message_digest = digest::sha256(b"hello");
    let signature = Signer::new(store.clone())
        .sign(&handle, &message_digest)
        .expect("signing");

    assert!(
        signer::verify(&public_key, &message_digest, &signature).expect("verification"),
        "signature must verify against its own public key"
    );

    // A key under a different label must not verify it.
    let other = KeyManager::new(store, demo_config("other"));
    let other_key = other
        .public_key(&other.get_or_create_key_pair().expect("generate other"))
        .expect("other public key");
    assert!(
        !signer::verify(&other_key, &message_digest, &signature).expect("verification"),
        "signature must not verify against a different key"
    );
}

#[test]
fn signature_is_bound_to_the_digest() {
    let store = Arc::new(SoftwareKeyStore::new());
    let manager = KeyManager::new(store.clone(), demo_config("demo"));
    let handle = manager.get_or_create_key_pair().expect("generate");
    let public_key = manager.public_key(&handle).expect("public key");

    let signature = Signer::new(store)
        .sign(&handle, &digest::sha256(b"hello"))
        .expect("signing");

    let other_digest = digest::sha256(b"hello!");
    assert!(!signer::verify(&public_key, &other_digest, &signature).expect("verification"));
}

#[test]
fn cancelled_presence_check_surfaces_as_cancelled() {
    let store = Arc::new(SoftwareKeyStore::with_presence(Arc::new(ScriptedPresence(
        PresenceOutcome::Cancelled,
    ))));
    let manager = KeyManager::new(store.clone(), demo_config("demo"));
    let handle = manager.get_or_create_key_pair().expect("generate");

    let err = Signer::new(store).sign(&handle, &digest::sha256(b"hello"));
    assert!(matches!(err, Err(KeyError::AuthenticationCancelled)));
}

#[test]
fn failed_presence_check_surfaces_as_failed() {
    let store = Arc::new(SoftwareKeyStore::with_presence(Arc::new(ScriptedPresence(
        PresenceOutcome::Failed,
    ))));
    let manager = KeyManager::new(store.clone(), demo_config("demo"));
    let handle = manager.get_or_create_key_pair().expect("generate");

    let err = Signer::new(store).sign(&handle, &digest::sha256(b"hello"));
    assert!(matches!(err, Err(KeyError::AuthenticationFailed)));
}

#[test]
fn pending_prompt_does_not_stall_unrelated_keys() {
    // A presence prompt can block indefinitely; while one is up, public-key
    // derivation for other labels must still go through.
    let gate = Arc::new(ParkedPresence::new());
    let store = Arc::new(SoftwareKeyStore::with_presence(gate.clone()));

    let gated = KeyManager::new(store.clone(), demo_config("gated"));
    let gated_handle = gated.get_or_create_key_pair().expect("generate gated");

    let public_policy =
        AccessControlPolicy::new(Protection::AlwaysAvailable, false, true).unwrap();
    let private_policy =
        AccessControlPolicy::new(Protection::AfterFirstUnlock, false, true).unwrap();
    let ungated = KeyManager::new(
        store.clone(),
        KeyConfig::new("ungated", public_policy, private_policy).unwrap(),
    );
    let ungated_handle = ungated.get_or_create_key_pair().expect("generate ungated");

    // Park a signing call inside the presence prompt.
    let signing_store = store.clone();
    let signing_handle = gated_handle.clone();
    let signing = thread::spawn(move || {
        Signer::new(signing_store).sign(&signing_handle, &digest::sha256(b"hello"))
    });
    gate.wait_until_entered();

    let (tx, rx) = mpsc::channel();
    let reader_store = store.clone();
    thread::spawn(move || {
        let _ = tx.send(reader_store.public_key(&ungated_handle));
    });
    let ungated_key = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("public key derivation must not wait on another key's prompt")
        .expect("public key");
    assert_eq!(ungated_key.as_bytes()[0], 0x04);

    // Releasing the prompt lets the parked signing complete normally.
    gate.release();
    let signature = signing.join().expect("signing thread").expect("signing");
    let gated_key = gated.public_key(&gated_handle).expect("gated public key");
    assert!(
        signer::verify(&gated_key, &digest::sha256(b"hello"), &signature).expect("verification")
    );
}

#[test]
fn presence_gate_does_not_apply_without_the_flag() {
    // No user-presence requirement on either half: a denying gate is never
    // consulted and signing succeeds.
    let store = Arc::new(SoftwareKeyStore::with_presence(Arc::new(ScriptedPresence(
        PresenceOutcome::Cancelled,
    ))));
    let public_policy =
        AccessControlPolicy::new(Protection::AlwaysAvailable, false, true).unwrap();
    let private_policy =
        AccessControlPolicy::new(Protection::AfterFirstUnlock, false, true).unwrap();
    let config = KeyConfig::new("ungated", public_policy, private_policy).unwrap();

    let manager = KeyManager::new(store.clone(), config);
    let handle = manager.get_or_create_key_pair().expect("generate");

    Signer::new(store)
        .sign(&handle, &digest::sha256(b"hello"))
        .expect("signing without presence gate");
}
