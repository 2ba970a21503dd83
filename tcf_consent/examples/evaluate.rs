use std::env::args;
use std::time::SystemTime;
use tcf_consent::evaluator::ConsentPolicyEvaluator;
use tcf_consent::store::shared_prefs;

fn main() {
    let path = args()
        .nth(1)
        .expect("usage: evaluate <shared_prefs.xml>");

    let store = shared_prefs::from_file(&path).expect("a valid preferences file");
    let evaluator = ConsentPolicyEvaluator::new(store);

    println!("GDPR applies: {}", evaluator.is_gdpr_applicable());
    println!("Ads: {}", evaluator.can_show_ads());
    println!("Personalized ads: {}", evaluator.can_show_personalized_ads());
    println!("Analytics: {:?}", evaluator.analytics_consent());
    println!(
        "TC string age: {} days",
        evaluator.consent_age_in_days(SystemTime::now())
    );
}
