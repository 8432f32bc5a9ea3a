//! Landing page section schemas and their fallback copy.
//!
//! Each struct's `Default` is the text the page shows when the matching
//! content document is missing or leaves a key out.

use serde::{Deserialize, Serialize};

use super::SectionSchema;
use crate::palette::BRANDING_SECTION;

/// Section holding the demo video.
pub const DEMO_SECTION: &str = "demo";

/// A card with a heading and one line of supporting text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitledItem {
    pub title: String,
    pub description: String,
}

impl TitledItem {
    fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_owned(),
            description: description.to_owned(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|&s| s.to_owned()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroContent {
    pub logo_url: String,
    pub logo_alt: String,
    pub badge_text: String,
    pub headline1: String,
    pub headline2: String,
    pub subheadline: String,
    pub cta_text: String,
    pub support_text: String,
}

impl Default for HeroContent {
    fn default() -> Self {
        Self {
            logo_url: "/static/brand/logo.svg".to_owned(),
            logo_alt: "KLYP Logo".to_owned(),
            badge_text: "Built for visionary travel agencies, TMCs, and tour creators".to_owned(),
            headline1: "KLYP Workbench".to_owned(),
            headline2: "The Future of Travel".to_owned(),
            subheadline: "Digitalize the chaos of servicing, and plug into a GenAI\u{2011}native \
                          universal ERP\u{2014}without writing a line of code."
                .to_owned(),
            cta_text: "Get Started Now".to_owned(),
            support_text: "Early Access: Starting from just $99/month".to_owned(),
        }
    }
}

impl SectionSchema for HeroContent {
    const SECTION: &'static str = "hero";
}

/// "Why travel needs a new OS".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProblemContent {
    pub title: String,
    pub intro: String,
    pub problems: Vec<String>,
}

impl Default for ProblemContent {
    fn default() -> Self {
        Self {
            title: "Why Travel Needs a New OS".to_owned(),
            intro: "The travel industry is drowning in outdated systems and manual processes"
                .to_owned(),
            problems: strings(&[
                "60% of travel ERPs still require costly manual customizations",
                "Servicing (refunds, ancillaries, reissues) is fragmented and chaotic",
                "Airlines offer millions in incentives\u{2014}most go unclaimed",
                "Startups waste 90% of dev time on integrating basic GDS and payment plumbing",
            ]),
        }
    }
}

impl SectionSchema for ProblemContent {
    const SECTION: &'static str = "problem";
}

/// "What we're building".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeaturesContent {
    pub title: String,
    pub intro: String,
    pub features: Vec<TitledItem>,
}

impl Default for FeaturesContent {
    fn default() -> Self {
        Self {
            title: "What We're Building".to_owned(),
            intro: "A domain\u{2011}specific AI model that composes travel\u{2011}ops workflows \
                    using plain\u{2011}English rules\u{2014}not code."
                .to_owned(),
            features: vec![
                TitledItem::new(
                    "Universal Travel ERP Cloud",
                    "DevOps\u{2011}native, version\u{2011}controlled",
                ),
                TitledItem::new("SLM Workflow Composer", "refunds, servicing, PLB triggers"),
                TitledItem::new("Incentive & Contract Engine", "auto\u{2011}track PLBs, bonuses"),
                TitledItem::new(
                    "Composable Microservices",
                    "flights, ancillaries, GDS, payments, invoicing",
                ),
            ],
        }
    }
}

impl SectionSchema for FeaturesContent {
    const SECTION: &'static str = "features";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DemoContent {
    pub title: String,
    pub video_title: String,
    pub video_description: String,
    pub video_duration: String,
    pub video_quality: String,
    /// Public URL of an uploaded video; empty shows the placeholder.
    pub video_url: String,
    pub video_type: String,
}

impl Default for DemoContent {
    fn default() -> Self {
        Self {
            title: "See It in Action".to_owned(),
            video_title: "Demo Video Coming Soon".to_owned(),
            video_description: "Watch how KLYP Workbench revolutionizes travel operations"
                .to_owned(),
            video_duration: "0:00 / 2:30".to_owned(),
            video_quality: "HD Quality".to_owned(),
            video_url: String::new(),
            video_type: String::new(),
        }
    }
}

impl DemoContent {
    /// Key holding the uploaded video's public URL.
    pub const VIDEO_URL_KEY: &'static str = "videoUrl";
    /// Key recording how the video got there.
    pub const VIDEO_TYPE_KEY: &'static str = "videoType";
    /// `videoType` of a video uploaded through the console.
    pub const VIDEO_TYPE_UPLOAD: &'static str = "upload";

    #[must_use]
    pub fn has_video(&self) -> bool {
        !self.video_url.trim().is_empty()
    }
}

impl SectionSchema for DemoContent {
    const SECTION: &'static str = DEMO_SECTION;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PricingContent {
    pub title: String,
    pub price: String,
    pub ribbon: String,
    pub benefits: Vec<String>,
    pub cta_text: String,
    pub note: String,
}

impl Default for PricingContent {
    fn default() -> Self {
        Self {
            title: "Early Access Pricing \u{2013} Limited Time".to_owned(),
            price: "Starting from just $99/month".to_owned(),
            ribbon: "First 100 signups get founder benefits".to_owned(),
            benefits: strings(&[
                "No setup fees",
                "Locked lifetime pricing\u{2014}save up to 70% vs public launch",
                "Full feature access during beta",
                "Priority onboarding & white\u{2011}glove support",
            ]),
            cta_text: "Join Now".to_owned(),
            note: "Limited to first 100 signups only".to_owned(),
        }
    }
}

impl SectionSchema for PricingContent {
    const SECTION: &'static str = "pricing";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudienceContent {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<TitledItem>,
}

impl Default for AudienceContent {
    fn default() -> Self {
        Self {
            title: "Who It's For".to_owned(),
            subtitle: "Built for forward\u{2011}thinking travel professionals ready to automate \
                       their operations"
                .to_owned(),
            items: vec![
                TitledItem::new("Agencies & OTAs", "tired of duct\u{2011}taped back offices"),
                TitledItem::new(
                    "Freelancer advisors",
                    "who want a pro\u{2011}grade tool without enterprise bloat",
                ),
                TitledItem::new(
                    "TMCs & B2B consolidators",
                    "looking to automate contract management & GDS plumbing",
                ),
                TitledItem::new("Tech\u{2011}led startups", "building custom travel stacks"),
            ],
        }
    }
}

impl SectionSchema for AudienceContent {
    const SECTION: &'static str = "audience";
}

/// The founding-user call to action and the sign-up form copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FoundingContent {
    pub title: String,
    pub text: String,
    pub card_title: String,
    pub form_prompt: String,
    pub cta_text: String,
    pub highlights: Vec<String>,
    pub signup_title: String,
    pub signup_intro: String,
}

impl Default for FoundingContent {
    fn default() -> Self {
        Self {
            title: "Be a Founding User".to_owned(),
            text: "We're onboarding a select group of early partners before launch. Get early \
                   access, shape the roadmap, and automate your travel operations from Day 1."
                .to_owned(),
            card_title: "Join the List".to_owned(),
            form_prompt: "Fill in a few quick questions\u{2014}we'll personalize your onboarding."
                .to_owned(),
            cta_text: "Join Now".to_owned(),
            highlights: strings(&[
                "No setup required",
                "White\u{2011}glove onboarding",
                "Join 50+ founding partners",
            ]),
            signup_title: "Join the Founders List".to_owned(),
            signup_intro: "Fill in your details below and we'll personalize your onboarding \
                           experience."
                .to_owned(),
        }
    }
}

impl SectionSchema for FoundingContent {
    const SECTION: &'static str = "founding";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterContent {
    pub logo_url: String,
    pub logo_alt: String,
    pub contact_email: String,
    pub copyright: String,
}

impl Default for FooterContent {
    fn default() -> Self {
        Self {
            logo_url: "/static/brand/logo.svg".to_owned(),
            logo_alt: "KLYP Logo".to_owned(),
            contact_email: "ping@klyp.travel".to_owned(),
            copyright: "\u{a9} 2024 KLYP. All rights reserved.".to_owned(),
        }
    }
}

impl SectionSchema for FooterContent {
    const SECTION: &'static str = "footer";
}

/// Brand colors; see [`crate::palette`] for how they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandingContent {
    pub primary_color: String,
    pub secondary_color: String,
}

impl SectionSchema for BrandingContent {
    const SECTION: &'static str = BRANDING_SECTION;
}
