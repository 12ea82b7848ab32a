//! End-to-end signing through the library pipeline.
//!
//! Uses height-4 trees so key generation stays fast.

use std::fs;

use qrl_offline_signer::address;
use qrl_offline_signer::config::WordlistSource;
use qrl_offline_signer::crypto::hash::{sha256, sha256_concat, HashFunction};
use qrl_offline_signer::crypto::xmss::{self, SEED_LEN};
use qrl_offline_signer::crypto::{Aes256CtrCipher, Descriptor};
use qrl_offline_signer::pipeline::{self, SignRequest};
use qrl_offline_signer::preimage;
use qrl_offline_signer::{
    FileLedger, NoLedger, OutputRequest, SeedForm, SignedTransaction, SignerError, SigningProvider,
    WalletRecord,
};
use zeroize::Zeroizing;

fn wallet(fill: u8) -> WalletRecord {
    let d = Descriptor::new(HashFunction::Sha2_256, 4).unwrap();
    WalletRecord::from_seed(d, &[fill; SEED_LEN], None).unwrap()
}

fn no_prompt() -> qrl_offline_signer::Result<Zeroizing<String>> {
    panic!("prompt must not be called")
}

fn single(recipient: &str, quantity: &str, hexseed: &str, ots: &str) -> SignRequest {
    SignRequest {
        outputs: OutputRequest {
            recipient: Some(recipient.to_string()),
            quantity: Some(quantity.to_string()),
            ..Default::default()
        },
        ots_index: ots.to_string(),
        hexseed: Some(Zeroizing::new(hexseed.to_string())),
        ..Default::default()
    }
}

#[tokio::test]
async fn signs_one_output_and_binds_hash() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tx.json");
    let sender = wallet(1);
    let recipient = wallet(2).address;

    let provider = SigningProvider::new(WordlistSource::None);
    let req = single(&recipient, "1", &sender.hexseed, "5");
    let prepared = pipeline::prepare(&req, 100, &provider, no_prompt).await.unwrap();
    assert_eq!(prepared.fee, 100);
    assert_eq!(prepared.outputs[0].amount, 1_000_000_000);

    let tx = prepared.sign_and_write(&out, &mut NoLedger).unwrap();

    let raw_to = address::decode(&recipient).unwrap();
    let mut expected_preimage = 100u64.to_be_bytes().to_vec();
    expected_preimage.extend_from_slice(raw_to.as_bytes());
    expected_preimage.extend_from_slice(&1_000_000_000u64.to_be_bytes());
    let outputs = tx.outputs().unwrap();
    assert_eq!(preimage::encode(tx.fee, &outputs), expected_preimage);

    let digest = sha256(&expected_preimage);
    assert!(xmss::verify(&digest, &tx.signature, &tx.public_key));
    assert_eq!(tx.hash, hex::encode(sha256_concat(&[&digest[..], &tx.signature, &tx.public_key])));
    assert_eq!(tx.ots, 5);
    assert_eq!(&tx.signature[..4], &5u32.to_be_bytes());
    assert_eq!(address::from_public_key(&tx.public_key).unwrap().to_string(), sender.address);

    let reloaded = SignedTransaction::read(&out).unwrap();
    assert_eq!(reloaded, tx);
    assert!(reloaded.verify().unwrap());
}

#[tokio::test]
async fn json_outputs_keep_their_order_in_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tx.json");
    let (a, b) = (wallet(3).address, wallet(4).address);
    let recipients = dir.path().join("recipients.json");
    fs::write(&recipients, format!(r#"{{"tx":[{{"to":"{b}","shor":"250"}},{{"to":"{a}","shor":"1"}}]}}"#)).unwrap();

    let req = SignRequest {
        outputs: OutputRequest { file: Some(recipients), ..Default::default() },
        fee: Some("10".into()),
        ots_index: "0".into(),
        hexseed: Some(Zeroizing::new(wallet(5).hexseed)),
        ..Default::default()
    };
    let provider = SigningProvider::new(WordlistSource::None);
    let tx = pipeline::prepare(&req, 100, &provider, no_prompt)
        .await
        .unwrap()
        .sign_and_write(&out, &mut NoLedger)
        .unwrap();

    assert_eq!(tx.amounts, vec![250, 1]);
    assert_eq!(tx.addrs_to[0], address::decode(&b).unwrap().as_bytes());
    assert_eq!(tx.addrs_to[1], address::decode(&a).unwrap().as_bytes());
    assert_eq!(tx.fee, 10);
    assert!(tx.verify().unwrap());
}

#[tokio::test]
async fn first_bad_entry_is_reported() {
    let good = wallet(6).address;
    let json = format!(r#"{{"tx":[{{"to":"{good}","shor":"1"}},{{"to":"Qbad"}},{{"shor":"1"}}]}}"#);
    let req = SignRequest {
        outputs: OutputRequest { json_object: Some(json), ..Default::default() },
        ots_index: "0".into(),
        hexseed: Some(Zeroizing::new(wallet(7).hexseed)),
        ..Default::default()
    };
    let provider = SigningProvider::new(WordlistSource::None);
    match pipeline::prepare(&req, 100, &provider, no_prompt).await {
        Err(SignerError::InvalidOutputEntry { index, reason }) => {
            assert_eq!(index, 1);
            assert!(reason.contains("valid QRL address"), "{reason}");
        }
        other => panic!("unexpected {:?}", other.err()),
    }
}

#[tokio::test]
async fn seed_length_is_checked() {
    let recipient = wallet(8).address;
    let provider = SigningProvider::new(WordlistSource::None);
    for len in [100usize, 101, 103] {
        let req = single(&recipient, "1", &"a".repeat(len), "0");
        match pipeline::prepare(&req, 100, &provider, no_prompt).await {
            Err(SignerError::SeedTooShort { form: SeedForm::HexSeed, found }) => assert_eq!(found, len),
            other => panic!("unexpected {:?}", other.err()),
        }
    }
}

#[tokio::test]
async fn encrypted_wallet_wrong_password_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");
    let mut rec = wallet(9);
    rec.encrypt(&Aes256CtrCipher, "password123");
    rec.save(&path).unwrap();

    let provider = SigningProvider::new(WordlistSource::None);
    let mut req = single(&wallet(10).address, "1", "", "0");
    req.hexseed = None;
    req.wallet = Some(path);

    req.password = Some(Zeroizing::new("wrong".into()));
    let res = pipeline::prepare(&req, 100, &provider, no_prompt).await;
    assert!(matches!(res, Err(SignerError::WalletDecrypt(_))));

    req.password = None;
    let prepared = pipeline::prepare(&req, 100, &provider, || Ok(Zeroizing::new("password123".into())))
        .await
        .unwrap();
    assert_eq!(prepared.from_address(), wallet(9).address);
}

#[tokio::test]
async fn wallet_and_hexseed_together_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");
    wallet(11).save(&path).unwrap();
    let mut req = single(&wallet(12).address, "1", &wallet(11).hexseed, "0");
    req.wallet = Some(path);
    let provider = SigningProvider::new(WordlistSource::None);
    let res = pipeline::prepare(&req, 100, &provider, no_prompt).await;
    assert!(matches!(res, Err(SignerError::ConflictingInput)));
}

#[tokio::test]
async fn ledger_refuses_second_use_of_an_index() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = FileLedger::open(&dir.path().join("ots.json")).unwrap();
    let provider = SigningProvider::new(WordlistSource::None);
    let req = single(&wallet(13).address, "2", &wallet(14).hexseed, "3");

    pipeline::prepare(&req, 100, &provider, no_prompt)
        .await
        .unwrap()
        .sign_and_write(&dir.path().join("a.json"), &mut ledger)
        .unwrap();

    let again = pipeline::prepare(&req, 100, &provider, no_prompt)
        .await
        .unwrap()
        .sign_and_write(&dir.path().join("b.json"), &mut ledger);
    assert!(matches!(again, Err(SignerError::OtsIndexReused(3))));
    assert!(!dir.path().join("b.json").exists());
}

#[tokio::test]
async fn index_past_tree_capacity_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let provider = SigningProvider::new(WordlistSource::None);
    let req = single(&wallet(15).address, "1", &wallet(16).hexseed, "16");
    let res = pipeline::prepare(&req, 100, &provider, no_prompt)
        .await
        .unwrap()
        .sign_and_write(&dir.path().join("tx.json"), &mut NoLedger);
    assert!(matches!(res, Err(SignerError::InvalidOtsIndex(_))));
}

#[tokio::test]
async fn short_mnemonic_is_a_length_error_without_a_wordlist() {
    let provider = SigningProvider::new(WordlistSource::None);
    let phrase = vec!["absorb"; 33].join(" ");
    let req = single(&wallet(17).address, "1", &phrase, "0");
    match pipeline::prepare(&req, 100, &provider, no_prompt).await {
        Err(SignerError::SeedTooShort { form: SeedForm::Mnemonic, found }) => assert_eq!(found, 33),
        other => panic!("unexpected {:?}", other.err()),
    }
}

#[tokio::test]
async fn failed_write_leaves_the_index_spent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("ots.json");
    let provider = SigningProvider::new(WordlistSource::None);
    let sender = wallet(18).hexseed;
    let to = wallet(19).address;

    let mut ledger = FileLedger::open(&ledger_path).unwrap();
    let first = pipeline::prepare(&single(&to, "1", &sender, "3"), 100, &provider, no_prompt)
        .await
        .unwrap()
        .sign_and_write(&dir.path().join("missing").join("tx.json"), &mut ledger);
    assert!(matches!(first, Err(SignerError::Io { .. })));

    let mut reopened = FileLedger::open(&ledger_path).unwrap();
    let out = dir.path().join("tx.json");
    let second = pipeline::prepare(&single(&to, "2", &sender, "3"), 100, &provider, no_prompt)
        .await
        .unwrap()
        .sign_and_write(&out, &mut reopened);
    assert!(matches!(second, Err(SignerError::OtsIndexReused(3))));
    assert!(!out.exists());
}

#[tokio::test]
async fn zero_seed_transfer_matches_known_hash() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tx.json");
    let hexseed = format!("000200{}", "00".repeat(SEED_LEN));
    let to = "Q000200ecffb27f3d7b11ccd048eb559277d64bb52bfda998341e66a9f11b2d07f6b2ee4f62c408";

    let provider = SigningProvider::new(WordlistSource::None);
    let prepared = pipeline::prepare(&single(to, "1", &hexseed, "5"), 100, &provider, no_prompt)
        .await
        .unwrap();
    assert_eq!(
        prepared.from_address(),
        "Q00020096e5c065cf961565169e795803c1e60f521af7a3ea0326b42aa40c0e75390e5d8f4336de"
    );
    let tx = prepared.sign_and_write(&out, &mut NoLedger).unwrap();

    let digest = sha256(&preimage::encode(tx.fee, &tx.outputs().unwrap()));
    assert_eq!(hex::encode(digest), "fda8b7e94e6242216bdfe3c053d806b6d2e1a60ae8445d774053a03c58d46b5e");
    assert_eq!(
        hex::encode(sha256(&tx.signature)),
        "33fa0383f000472d89347337b3a79d29da968ddd769d5ce2b66721f800453e4d"
    );
    assert_eq!(tx.hash, "faf0662ce892d9161ccf04902cba6c8f837879c95ca1f2d333d522f703ca00cc");
}
