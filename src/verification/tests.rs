use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::guards::{is_uncertain_answer, token_overlap};
use super::report::split_analysis;
use super::schema::parse_verdict;
use super::*;
use crate::constants::{FALLBACK_ANALYSIS_TEXT, UNAVAILABLE_ANALYSIS_TEXT};
use crate::llm::{ChatRequest, LlmError, MockChatProvider};
use crate::model::{
    Claim, Confidence, Item, ItemStatus, LinkedPostStatus, Location, NewClaim, Question,
};
use crate::store::{MemoryStore, Store};

const WALLET_DESCRIPTION: &str = "Black leather bifold wallet with a zipper coin pocket, \
two credit cards, a library card and a faded receipt from a coffee shop";

struct Scenario {
    store: Arc<MemoryStore>,
    item: Item,
    questions: Vec<Question>,
}

impl Scenario {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let item = Item::new(
            Uuid::new_v4(),
            ItemStatus::Found,
            "Wallet, black leather",
            WALLET_DESCRIPTION,
            "Accessories",
            Location::new("Central Station"),
        );
        store.insert_item(item.clone()).await.unwrap();

        let mut questions = Vec::new();
        for (text, answer) in [
            ("What brand is it?", Some("Fossil")),
            ("What is inside the coin pocket?", None),
            ("Which library card is inside?", Some("Austin Public Library")),
        ] {
            let mut q = Question::new(item.id, text);
            if let Some(answer) = answer {
                q = q.with_answer(answer);
            }
            questions.push(store.insert_question(q).await.unwrap());
        }

        Self {
            store,
            item,
            questions,
        }
    }

    async fn claim(&self, answers: [&str; 3], photos: usize, linked: Option<Uuid>) -> Claim {
        let answers: BTreeMap<Uuid, String> = self
            .questions
            .iter()
            .zip(answers)
            .map(|(q, a)| (q.id, a.to_string()))
            .collect();
        let claim = Claim::submitted(NewClaim {
            item_id: self.item.id,
            claimant_id: Uuid::new_v4(),
            answers,
            photo_urls: (0..photos)
                .map(|i| format!("https://cdn.example/claim/{i}.jpg"))
                .collect(),
            linked_post_id: linked,
        });
        self.store.insert_claim(claim).await.unwrap()
    }

    async fn lost_post(&self, description: &str) -> Item {
        let post = Item::new(
            Uuid::new_v4(),
            ItemStatus::Lost,
            "Lost my wallet",
            description,
            "Accessories",
            Location::new("Central Station"),
        );
        self.store.insert_item(post).await.unwrap()
    }

    fn verifier(&self, llm: MockChatProvider) -> ClaimVerifier {
        ClaimVerifier::new(self.store.clone(), Arc::new(llm))
    }

    async fn stored(&self, claim_id: Uuid) -> Claim {
        self.store.get_claim(claim_id).await.unwrap().unwrap()
    }
}

fn verdict_reply(confidence: u8) -> String {
    json!({
        "confidence_percentage": confidence,
        "analysis": "[VERDICT] Likely the owner. [ELABORATION] Answers are consistent.",
        "question_analysis": {},
        "linked_post_analysis": {"status": "Partial Match", "score": 50, "explanation": "Similar"},
        "evidence_analysis": {"strength": "Moderate", "explanation": "Answers and photos",
                              "photo_count": 9, "photos_considered": true}
    })
    .to_string()
}

async fn verified_confidence(scenario: &Scenario, claim: &Claim, reply: &str) -> u8 {
    scenario
        .verifier(MockChatProvider::replying(reply))
        .verify(claim.id)
        .await
        .unwrap();
    scenario
        .stored(claim.id)
        .await
        .verdict_confidence()
        .unwrap()
        .value()
}

fn photo_reply_for(request: &ChatRequest) -> Result<String, LlmError> {
    let url = request
        .messages
        .last()
        .and_then(|m| m.content.image_urls().first().map(|u| u.to_string()))
        .unwrap_or_default();
    if url.ends_with("0.jpg") {
        Ok(json!({
            "is_likely_original": false,
            "confidence": 80,
            "analysis": "Studio lighting and a watermark",
            "red_flags": ["stock photo watermark", "studio background"]
        })
        .to_string())
    } else {
        Ok(json!({
            "is_likely_original": true,
            "confidence": 70,
            "analysis": "Casual phone photo",
            "red_flags": ["Stock photo watermark"]
        })
        .to_string())
    }
}

#[test]
fn test_uncertain_answer_spellings() {
    for answer in ["I don't know", "idk", "Not sure.", "I'm not sure", "no idea!", "I do not know"] {
        assert!(is_uncertain_answer(answer), "{answer:?}");
    }
    for answer in ["Sorry, I really don't know", "I am not sure", "Um... no idea"] {
        assert!(is_uncertain_answer(answer), "{answer:?}");
    }
    for answer in [
        "Fossil",
        "",
        "I know it is brown",
        "Austin Public Library",
        "Not sure, but I think it is a Fossil",
        "I don't know the exact count, maybe three coins",
        "I forgot the brand but it has a red stripe inside",
    ] {
        assert!(!is_uncertain_answer(answer), "{answer:?}");
    }
}

#[test]
fn test_token_overlap() {
    assert_eq!(token_overlap("red bag", "Red, bag!"), 1.0);
    assert_eq!(token_overlap("", "anything"), 0.0);
    let recolored = WALLET_DESCRIPTION.replace("Black", "Brown");
    assert!(token_overlap(&recolored, WALLET_DESCRIPTION) >= 0.75);
    assert!(token_overlap("blue umbrella", WALLET_DESCRIPTION) < 0.1);
}

#[tokio::test]
async fn test_dossier_juxtaposes_answers() {
    let s = Scenario::new().await;
    let claim = s.claim(["Fossil", "Coins", "Austin library"], 2, None).await;
    let dossier = Dossier::new(&claim, &s.item, None, &s.questions);
    let text = dossier.render();

    assert!(text.contains(WALLET_DESCRIPTION));
    assert!(text.contains("Claimant's answer: Fossil\nOwner's answer: Fossil"));
    assert!(text.contains("Claimant's answer: Coins\nOwner's answer: not provided"));
    assert!(text.contains("uploaded 2 photo(s)"));
    assert!(!text.contains("cdn.example"));
    assert!(text.contains(&s.questions[0].id.to_string()));
}

#[tokio::test]
async fn test_unparseable_reply_falls_back() {
    let s = Scenario::new().await;
    let claim = s.claim(["a", "b", "c"], 0, None).await;
    let dossier = Dossier::new(&claim, &s.item, None, &s.questions);

    let verdict = parse_verdict("The claimant seems legit.", &dossier);
    assert!(verdict.fallback);
    assert_eq!(verdict.confidence, Confidence::new(50));
    assert_eq!(verdict.analysis, FALLBACK_ANALYSIS_TEXT);
    assert!(verdict.questions.is_empty());

    let outcome = s
        .verifier(MockChatProvider::replying("not json"))
        .verify(claim.id)
        .await
        .unwrap();
    assert_eq!(outcome, VerificationOutcome::Fallback);
    let stored = s.stored(claim.id).await;
    assert_eq!(stored.ai_verdict, "50");
    assert_eq!(stored.ai_analysis, FALLBACK_ANALYSIS_TEXT);
}

#[tokio::test]
async fn test_reply_is_coerced_into_schema() {
    let s = Scenario::new().await;
    let claim = s.claim(["Fossil", "Coins", "Austin"], 0, None).await;
    let dossier = Dossier::new(&claim, &s.item, None, &s.questions);
    let first_id = s.questions[0].id.to_string();
    let second_id = s.questions[1].id.to_string();
    let unknown_id = Uuid::new_v4().to_string();
    let reply = json!({
        "confidence_percentage": "72%",
        "analysis": {"verdict": "Probably the owner", "elaboration": "Brand matches"},
        "question_analysis": {
            first_id.clone(): {"status": "correct", "explanation": "Exact"},
            second_id.clone(): {"status": "sort of", "score": "0.4"},
            unknown_id: {"status": "Correct"}
        }
    })
    .to_string();

    let verdict = parse_verdict(&reply, &dossier);

    assert_eq!(verdict.confidence, Confidence::new(72));
    assert_eq!(
        verdict.analysis,
        "[VERDICT] Probably the owner\n[ELABORATION] Brand matches"
    );
    assert_eq!(verdict.questions.len(), 2);
    let first = &verdict.questions[&first_id];
    assert_eq!(first.score, Confidence::MAX);
    let second = &verdict.questions[&second_id];
    assert_eq!(second.score, Confidence::new(40));
    assert!(verdict.linked_post.is_none());
}

#[tokio::test]
async fn test_missing_confidence_defaults_to_fifty() {
    let s = Scenario::new().await;
    let claim = s.claim(["a", "b", "c"], 0, None).await;
    let dossier = Dossier::new(&claim, &s.item, None, &s.questions);
    let verdict = parse_verdict(r#"{"confidence_percentage": "high", "analysis": "ok"}"#, &dossier);
    assert!(!verdict.fallback);
    assert_eq!(verdict.confidence, Confidence::new(50));
}

#[tokio::test]
async fn test_uncertainty_penalty_is_monotonic() {
    let s = Scenario::new().await;
    let reply = verdict_reply(60);

    let none = s.claim(["Fossil", "Coins", "Austin"], 0, None).await;
    let wrong = s.claim(["Gucci", "Keys", "Dallas"], 0, None).await;
    let one = s.claim(["Fossil", "I don't know", "Austin"], 0, None).await;
    let two = s.claim(["idk", "I don't know", "Austin"], 0, None).await;

    let none = verified_confidence(&s, &none, &reply).await;
    let wrong = verified_confidence(&s, &wrong, &reply).await;
    let one = verified_confidence(&s, &one, &reply).await;
    let two = verified_confidence(&s, &two, &reply).await;

    assert_eq!(none, wrong);
    assert_eq!(one, 60);
    assert!(two < one);
    assert_eq!(two, 40);
}

#[tokio::test]
async fn test_matching_linked_post_is_strong_and_raises_confidence() {
    let s = Scenario::new().await;
    let post = s
        .lost_post(&WALLET_DESCRIPTION.replace("Black", "Brown"))
        .await;
    let reply = verdict_reply(60);

    let linked = s.claim(["Fossil", "Coins", "Austin"], 0, Some(post.id)).await;
    let unlinked = s.claim(["Fossil", "Coins", "Austin"], 0, None).await;

    let linked_confidence = verified_confidence(&s, &linked, &reply).await;
    let unlinked_confidence = verified_confidence(&s, &unlinked, &reply).await;

    let stored = s.stored(linked.id).await;
    let analysis = stored.ai_question_analysis.linked_post_analysis.unwrap();
    assert_eq!(analysis.status, LinkedPostStatus::StrongMatch);
    assert!(linked_confidence > unlinked_confidence);
    assert!(
        s.stored(unlinked.id)
            .await
            .ai_question_analysis
            .linked_post_analysis
            .is_none()
    );
}

#[tokio::test]
async fn test_unrelated_linked_post_is_not_upgraded() {
    let s = Scenario::new().await;
    let post = s.lost_post("Blue umbrella with a wooden handle").await;
    let claim = s.claim(["Fossil", "Coins", "Austin"], 0, Some(post.id)).await;

    let confidence = verified_confidence(&s, &claim, &verdict_reply(60)).await;

    let stored = s.stored(claim.id).await;
    assert_eq!(
        stored.ai_question_analysis.linked_post_analysis.unwrap().status,
        LinkedPostStatus::PartialMatch
    );
    assert_eq!(confidence, 60);
}

#[tokio::test]
async fn test_zero_photo_claim_has_no_photo_fields_and_skips_checker() {
    let s = Scenario::new().await;
    let claim = s.claim(["Fossil", "Coins", "Austin"], 0, None).await;
    verified_confidence(&s, &claim, &verdict_reply(60)).await;

    let evidence = s
        .stored(claim.id)
        .await
        .ai_question_analysis
        .evidence_analysis
        .unwrap();
    assert_eq!(evidence.photo_count, None);
    assert_eq!(evidence.photos_considered, None);

    let llm = Arc::new(MockChatProvider::new(photo_reply_for));
    let outcome = PhotoVerifier::new(s.store.clone(), llm.clone())
        .verify(claim.id)
        .await
        .unwrap();
    assert_eq!(outcome, PhotoOutcome::Skipped);
    assert_eq!(llm.call_count(), 0);
    assert!(
        s.stored(claim.id)
            .await
            .ai_question_analysis
            .photo_verification
            .is_none()
    );
}

#[tokio::test]
async fn test_photo_count_comes_from_claim() {
    let s = Scenario::new().await;
    let claim = s.claim(["Fossil", "Coins", "Austin"], 2, None).await;
    verified_confidence(&s, &claim, &verdict_reply(60)).await;

    let evidence = s
        .stored(claim.id)
        .await
        .ai_question_analysis
        .evidence_analysis
        .unwrap();
    assert_eq!(evidence.photo_count, Some(2));
    assert_eq!(evidence.photos_considered, Some(true));
}

#[tokio::test]
async fn test_missing_provider_marks_unavailable() {
    let s = Scenario::new().await;
    let claim = s.claim(["a", "b", "c"], 1, None).await;

    let outcome = s
        .verifier(MockChatProvider::disabled())
        .verify(claim.id)
        .await
        .unwrap();

    assert_eq!(outcome, VerificationOutcome::Unavailable);
    let stored = s.stored(claim.id).await;
    assert_eq!(stored.ai_verdict, "0");
    assert_eq!(stored.ai_analysis, UNAVAILABLE_ANALYSIS_TEXT);

    let photos = PhotoVerifier::new(s.store.clone(), Arc::new(MockChatProvider::disabled()))
        .verify(claim.id)
        .await
        .unwrap();
    assert_eq!(photos, PhotoOutcome::Skipped);
}

#[tokio::test]
async fn test_transport_failure_propagates_without_writing() {
    let s = Scenario::new().await;
    let claim = s.claim(["a", "b", "c"], 0, None).await;
    let llm = MockChatProvider::new(|_| {
        Err(LlmError::Http {
            model: "gpt-4o-mini".to_string(),
            status: 503,
            body: String::new(),
        })
    });

    let err = s.verifier(llm).verify(claim.id).await.unwrap_err();

    assert!(matches!(err, VerificationError::Provider(_)));
    assert_eq!(s.stored(claim.id).await, claim);
}

#[tokio::test]
async fn test_photo_aggregate_keeps_flags_of_minority() {
    let s = Scenario::new().await;
    let claim = s.claim(["a", "b", "c"], 3, None).await;

    let outcome = PhotoVerifier::new(s.store.clone(), Arc::new(MockChatProvider::new(photo_reply_for)))
        .verify(claim.id)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        PhotoOutcome::Completed {
            authentic: true,
            photos: 3
        }
    );

    let stored = s.stored(claim.id).await;
    let summary = stored.ai_question_analysis.photo_verification.unwrap();
    assert_eq!(summary.original_count, 2);
    assert_eq!(summary.overall_assessment, "Photos appear authentic");
    assert_eq!(
        summary.red_flags_summary,
        vec!["stock photo watermark", "studio background"]
    );
    assert_eq!(summary.average_confidence, Confidence::new(73));
    assert!(stored.ai_analysis.ends_with(&summary.summary));
}

#[tokio::test]
async fn test_unparseable_photo_defaults_to_original() {
    let s = Scenario::new().await;
    let claim = s.claim(["a", "b", "c"], 1, None).await;
    let verifier = PhotoVerifier::new(s.store.clone(), Arc::new(MockChatProvider::replying("???")));

    let verdict = verifier.check_photo(&claim.photo_urls[0]).await;

    assert!(verdict.is_likely_original);
    assert_eq!(verdict.confidence, Confidence::ZERO);
}

#[test]
fn test_summary_of_mostly_suspect_photos() {
    let verdict = |original: bool| crate::model::PhotoVerdict {
        url: "u".to_string(),
        is_likely_original: original,
        confidence: Confidence::new(90),
        analysis: String::new(),
        red_flags: vec![],
    };
    let summary = summarize_photos(vec![verdict(false), verdict(false), verdict(true)]);
    assert!(!summary.authentic);
    assert_eq!(summary.overall_assessment, "Photos may not be original");

    let summary = summarize_photos(vec![verdict(false), verdict(true)]);
    assert!(summary.authentic);
}

#[tokio::test]
async fn test_concurrent_writers_keep_each_others_keys() {
    let s = Scenario::new().await;
    let claim = s.claim(["Fossil", "Coins", "Austin"], 2, None).await;
    let verifier = s.verifier(MockChatProvider::replying(verdict_reply(64)));
    let photos = PhotoVerifier::new(s.store.clone(), Arc::new(MockChatProvider::new(photo_reply_for)));

    let (verdict, photo) = tokio::join!(verifier.verify(claim.id), photos.verify(claim.id));
    verdict.unwrap();
    photo.unwrap();

    let stored = s.stored(claim.id).await;
    assert_eq!(stored.ai_verdict, "64");
    assert!(stored.ai_analysis.starts_with("[VERDICT] Likely the owner."));
    assert!(stored.ai_analysis.contains("Photo verification:"));
    assert!(stored.ai_question_analysis.evidence_analysis.is_some());
    assert!(stored.ai_question_analysis.photo_verification.is_some());
}

#[tokio::test]
async fn test_report_strips_markers() {
    let s = Scenario::new().await;
    let claim = s.claim(["Fossil", "Coins", "Austin"], 0, None).await;
    let pending = ClaimReport::from_claim(&claim);
    assert!(pending.pending);
    assert_eq!(pending.confidence, Some(Confidence::ZERO));

    verified_confidence(&s, &claim, &verdict_reply(64)).await;
    let report = ClaimReport::from_claim(&s.stored(claim.id).await);
    assert!(!report.pending);
    assert_eq!(report.verdict, "Likely the owner.");
    assert_eq!(report.elaboration, "Answers are consistent.");
    assert_eq!(report.confidence, Some(Confidence::new(64)));
}

#[test]
fn test_split_analysis_without_markers() {
    assert_eq!(
        split_analysis("Plain text"),
        ("Plain text".to_string(), String::new())
    );
}
