use crate::error::Result;
use crate::llm::LlmClient;

/// What the user is asking for, as decided by a single classification
/// call. Anything the classifier returns outside the known labels becomes
/// `Unknown`, which callers must handle explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    TravelPlan,
    CustomerSupport,
    Reservation,
    Unknown,
}

impl Intent {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "travel_plan" => Intent::TravelPlan,
            "customer_support" => Intent::CustomerSupport,
            "reservation" => Intent::Reservation,
            _ => Intent::Unknown,
        }
    }
}

fn classification_prompt(message: &str) -> String {
    format!(
        "Your job is to classify intent.\n\
         \n\
         Choose one of the following intents:\n\
         - travel_plan\n\
         - customer_support\n\
         - reservation\n\
         \n\
         User: {}\n\
         Intent:",
        message
    )
}

pub async fn classify(llm: &dyn LlmClient, message: &str) -> Result<Intent> {
    let reply = llm.chat("", &classification_prompt(message)).await?;
    let intent = Intent::from_label(&reply);
    log::debug!("classified intent {:?} from label {:?}", intent, reply.trim());
    Ok(intent)
}
