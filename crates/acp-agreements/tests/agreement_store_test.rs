use acp_agreements::{AgreementStore, AmendChanges};
use acp_persistence::{AgreementsRepo, Gateway};
use acp_types::agreement::{AgreementStatus, Party, Term, TermType};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

async fn fresh_store() -> AgreementStore {
    let gateway = Gateway::connect("sqlite::memory:").await.unwrap();
    AgreementStore::new(AgreementsRepo::new(gateway))
}

fn keypair() -> (SigningKey, String) {
    let key = SigningKey::generate(&mut OsRng);
    let address = bs58::encode(key.verifying_key().to_bytes()).into_string();
    (key, address)
}

fn unsigned_party(address: &str, role: &str) -> Party {
    Party {
        address: address.to_string(),
        role: role.to_string(),
        signature: None,
        signed_at: None,
    }
}

#[tokio::test]
async fn signing_transitions_draft_to_proposed_to_signed() {
    let store = fresh_store().await;
    let (buyer_key, buyer_addr) = keypair();
    let (seller_key, seller_addr) = keypair();

    let agreement = store
        .create(
            "feed subscription".into(),
            "monthly access".into(),
            vec![unsigned_party(&buyer_addr, "buyer"), unsigned_party(&seller_addr, "seller")],
            vec![],
            None,
            None,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(agreement.status, AgreementStatus::Draft);

    let after_first = store.sign(&agreement.id, &buyer_addr, &buyer_key).await.unwrap();
    assert_eq!(after_first.status, AgreementStatus::Proposed);

    let after_second = store.sign(&agreement.id, &seller_addr, &seller_key).await.unwrap();
    assert_eq!(after_second.status, AgreementStatus::Signed);

    assert!(store.verify_party_signature(&agreement.id, &buyer_addr).await.unwrap());
    assert!(store.verify_party_signature(&agreement.id, &seller_addr).await.unwrap());
}

#[tokio::test]
async fn non_party_cannot_sign() {
    let store = fresh_store().await;
    let (_buyer_key, buyer_addr) = keypair();
    let (stranger_key, stranger_addr) = keypair();

    let agreement = store
        .create(
            "t".into(),
            "d".into(),
            vec![unsigned_party(&buyer_addr, "buyer")],
            vec![],
            None,
            None,
            None,
            None,
        )
        .await
        .unwrap();

    let err = store.sign(&agreement.id, &stranger_addr, &stranger_key).await.unwrap_err();
    assert!(matches!(err, acp_types::AcpError::Unauthorized(_)));
}

#[tokio::test]
async fn complete_term_auto_completes_agreement() {
    let store = fresh_store().await;
    let agreement = store
        .create(
            "t".into(),
            "d".into(),
            vec![],
            vec![Term {
                id: "term-1".into(),
                term_type: TermType::Deliverable,
                description: "ship report".into(),
                value: None,
                due_date: None,
                completed: false,
            }],
            None,
            None,
            None,
            None,
        )
        .await
        .unwrap();

    let updated = store.complete_term(&agreement.id, "term-1").await.unwrap();
    assert_eq!(updated.status, AgreementStatus::Completed);
}

#[tokio::test]
async fn amend_bumps_version_and_clears_signatures() {
    let store = fresh_store().await;
    let (buyer_key, buyer_addr) = keypair();

    let agreement = store
        .create(
            "t".into(),
            "d".into(),
            vec![unsigned_party(&buyer_addr, "buyer")],
            vec![],
            None,
            None,
            None,
            None,
        )
        .await
        .unwrap();
    store.sign(&agreement.id, &buyer_addr, &buyer_key).await.unwrap();

    let amended = store
        .amend(
            &agreement.id,
            AmendChanges {
                title: Some("revised title".into()),
                ..Default::default()
            },
            &buyer_addr,
        )
        .await
        .unwrap();

    assert_eq!(amended.version, 2);
    assert_eq!(amended.previous_version_hash.as_deref(), Some(agreement.hash.as_str()));
    assert!(amended.parties.iter().all(|p| p.signature.is_none()));
    assert_eq!(amended.status, AgreementStatus::Draft);

    let chain = store.verify_chain(&amended.id).await.unwrap();
    assert_eq!(chain.len(), 2);
}

#[tokio::test]
async fn export_import_roundtrips_and_rejects_tampering() {
    let store = fresh_store().await;
    let agreement = store
        .create("t".into(), "d".into(), vec![], vec![], None, None, None, None)
        .await
        .unwrap();

    let exported = store.export(&agreement).unwrap();
    let imported = store.import(&exported).unwrap();
    assert_eq!(imported.id, agreement.id);
    assert_eq!(imported.hash, agreement.hash);

    let mut tampered_bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &exported).unwrap();
    let tamper_idx = tampered_bytes.len() - 5;
    tampered_bytes[tamper_idx] ^= 0xFF;
    let tampered = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &tampered_bytes);
    assert!(store.import(&tampered).is_err());
}
