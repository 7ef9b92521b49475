//! auto-negotiation
//!
//! accepts a proposal outright when it meets the service's asking price and
//! a minimum 24h lead time; otherwise counters with the service's own terms
//! and a 7-day deadline.

use acp_agreements::hashing::compute_hash;
use acp_types::agreement::{Agreement, AgreementStatus, Party, Term, TermType};
use acp_types::ids::AgreementId;
use acp_types::now_millis;
use acp_types::AcpResult;

use crate::request::DiscoveryMatch;

const MIN_LEAD_TIME_MS: i64 = 24 * 60 * 60 * 1000;
const COUNTER_OFFER_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct CounterOffer {
    pub price: rust_decimal::Decimal,
    pub deadline: i64,
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone)]
pub enum NegotiationOutcome {
    Accepted(Agreement),
    Countered(CounterOffer),
}

fn build_terms(matched: &DiscoveryMatch, price: rust_decimal::Decimal, deadline: i64, custom_terms: &[Term]) -> Vec<Term> {
    let mut terms = vec![
        Term {
            id: "payment".into(),
            term_type: TermType::Payment,
            description: format!("payment of {price} {}", matched.service.pricing.currency),
            value: Some(price),
            due_date: None,
            completed: false,
        },
        Term {
            id: "deliverable".into(),
            term_type: TermType::Deliverable,
            description: matched.service.capability.name.clone(),
            value: None,
            due_date: None,
            completed: false,
        },
        Term {
            id: "deadline".into(),
            term_type: TermType::Deadline,
            description: "service delivery deadline".into(),
            value: None,
            due_date: Some(deadline),
            completed: false,
        },
    ];
    terms.extend(custom_terms.iter().cloned());
    terms
}

pub fn negotiate(
    matched: &DiscoveryMatch,
    buyer: &str,
    proposed_price: Option<rust_decimal::Decimal>,
    proposed_deadline: Option<i64>,
    custom_terms: Vec<Term>,
) -> AcpResult<NegotiationOutcome> {
    let now = now_millis();
    let service_price = matched.service.pricing.amount;

    let price_ok = proposed_price.map(|p| p >= service_price).unwrap_or(true);
    let deadline_ok = proposed_deadline.map(|d| d >= now + MIN_LEAD_TIME_MS).unwrap_or(true);

    if price_ok && deadline_ok {
        let price = proposed_price.unwrap_or(service_price);
        let deadline = proposed_deadline.unwrap_or(now + MIN_LEAD_TIME_MS);
        let terms = build_terms(matched, price, deadline, &custom_terms);

        let mut agreement = Agreement {
            id: AgreementId::new(),
            hash: String::new(),
            title: format!("service agreement: {}", matched.service.capability.name),
            description: matched.service.capability.description.clone(),
            parties: vec![
                Party { address: buyer.to_string(), role: "buyer".into(), signature: None, signed_at: None },
                Party { address: matched.agent.address.as_str().to_string(), role: "seller".into(), signature: None, signed_at: None },
            ],
            terms,
            total_value: Some(price),
            currency: Some(matched.service.pricing.currency.clone()),
            start_date: Some(now),
            end_date: Some(deadline),
            escrow_id: None,
            version: 1,
            previous_version_hash: None,
            status: AgreementStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        agreement.hash = compute_hash(&agreement)?;
        Ok(NegotiationOutcome::Accepted(agreement))
    } else {
        let deadline = now + COUNTER_OFFER_WINDOW_MS;
        let terms = build_terms(matched, service_price, deadline, &custom_terms);
        Ok(NegotiationOutcome::Countered(CounterOffer {
            price: service_price,
            deadline,
            terms,
        }))
    }
}
