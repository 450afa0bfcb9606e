//! Page assembly - the portfolio's single-page layout.
//!
//! Wires the whole runtime together the way the page is actually laid out:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ hero        (eager, #home)   │
//! │ about       (gate, 1200px)   │
//! │ skills      (gate, default)  │
//! │ projects    (gate, default)  │
//! │ contact     (gate, default)  │
//! │ footer      (gate, 800px,    │
//! │              never forced)   │
//! └──────────────────────────────┘
//! ```
//!
//! The hero mounts eagerly and carries the `home` anchor. Each deferred
//! section's gate is fed its force flag from the navigator; the footer has
//! no anchor and is never a navigation target, so its gate only ever opens
//! on proximity. A scroll-progress mirror and a pointer mirror run
//! alongside for the progress bar and the cursor glow.
//!
//! Section contents are opaque renderables supplied by the caller - their
//! visuals and data are not this crate's concern.

use std::rc::Rc;

use tracing::debug;

use crate::config::PageConfig;
use crate::engine::{allocate_index, release_index};
use crate::env::{Environment, RegionKey};
use crate::gate::{deferred, GateHandle, PLACEHOLDER_MIN_HEIGHT};
use crate::nav::{Navigator, RetryState};
use crate::state::{track_pointer, track_progress, PointerHandle, ProgressHandle};
use crate::types::{Cleanup, Point, Px, SectionId};

// =============================================================================
// Section renderables
// =============================================================================

/// Opaque content renderer for one section: receives the region to render
/// into, returns the content's cleanup.
pub type SectionRender = Box<dyn FnOnce(RegionKey) -> Cleanup>;

/// The six renderables the page is assembled from, in document order.
pub struct PageSections {
    pub hero: SectionRender,
    pub about: SectionRender,
    pub skills: SectionRender,
    pub projects: SectionRender,
    pub contact: SectionRender,
    pub footer: SectionRender,
}

impl PageSections {
    /// Stand-in contents for demos and tests: each render tags its region
    /// with the section's element id and a fixed height.
    pub fn simulated(env: &Rc<dyn Environment>) -> PageSections {
        PageSections {
            hero: stand_in(env, None, 2400.0),
            about: stand_in(env, Some("about"), 1200.0),
            skills: stand_in(env, Some("skills"), 1000.0),
            projects: stand_in(env, Some("projects"), 1600.0),
            contact: stand_in(env, Some("contact"), 700.0),
            footer: stand_in(env, None, 400.0),
        }
    }
}

fn stand_in(env: &Rc<dyn Environment>, id: Option<&'static str>, height: Px) -> SectionRender {
    let env = env.clone();
    Box::new(move |region| {
        if let Some(id) = id {
            env.set_region_id(region, Some(id));
        }
        env.set_region_height(region, height);
        Box::new(move || {
            if id.is_some() {
                env.set_region_id(region, None);
            }
            env.set_region_height(region, PLACEHOLDER_MIN_HEIGHT);
        })
    })
}

// =============================================================================
// Page Handle
// =============================================================================

/// Handle to a mounted page.
///
/// Dropping the handle tears everything down; [`PageHandle::unmount`] does
/// it in a deterministic order (navigator first, so no retry chain runs
/// against a half-removed document).
pub struct PageHandle {
    navigator: Option<Navigator>,
    hero_cleanup: Option<Cleanup>,
    hero_region: RegionKey,
    hero_index: usize,
    about: Option<GateHandle>,
    skills: Option<GateHandle>,
    projects: Option<GateHandle>,
    contact: Option<GateHandle>,
    footer: Option<GateHandle>,
    progress: Option<ProgressHandle>,
    pointer: Option<PointerHandle>,
    env: Rc<dyn Environment>,
}

impl PageHandle {
    /// Whether a section's content exists. The hero is always mounted.
    pub fn is_mounted(&self, section: SectionId) -> bool {
        match section {
            SectionId::Home => true,
            SectionId::About => gate_mounted(&self.about),
            SectionId::Skills => gate_mounted(&self.skills),
            SectionId::Projects => gate_mounted(&self.projects),
            SectionId::Contact => gate_mounted(&self.contact),
        }
    }

    /// Whether the footer's content exists.
    pub fn is_footer_mounted(&self) -> bool {
        gate_mounted(&self.footer)
    }

    /// Current navigation target.
    pub fn target(&self) -> Option<SectionId> {
        self.navigator.as_ref().and_then(Navigator::target)
    }

    /// State of the live scroll retry chain, if any.
    pub fn retry_state(&self) -> Option<RetryState> {
        self.navigator.as_ref().and_then(Navigator::retry_state)
    }

    /// Current scroll progress ratio in `[0, 1]`.
    pub fn scroll_progress(&self) -> f32 {
        self.progress.as_ref().map(ProgressHandle::get).unwrap_or(0.0)
    }

    /// Latest pointer position (for the glow element).
    pub fn pointer_position(&self) -> Point {
        self.pointer.as_ref().map(PointerHandle::get).unwrap_or_default()
    }

    /// Tear the page down: cancel retries, disconnect observers and
    /// listeners, unmount every section.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.navigator.is_none() {
            return;
        }
        debug!("unmounting page");
        if let Some(navigator) = self.navigator.take() {
            navigator.unmount();
        }
        for gate in [
            self.footer.take(),
            self.contact.take(),
            self.projects.take(),
            self.skills.take(),
            self.about.take(),
        ]
        .into_iter()
        .flatten()
        {
            gate.unmount();
        }
        if let Some(cleanup) = self.hero_cleanup.take() {
            cleanup();
        }
        release_index(self.hero_index);
        self.env.remove_region(self.hero_region);
        if let Some(progress) = self.progress.take() {
            progress.unmount();
        }
        if let Some(pointer) = self.pointer.take() {
            pointer.unmount();
        }
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn gate_mounted(gate: &Option<GateHandle>) -> bool {
    gate.as_ref().map(GateHandle::is_mounted).unwrap_or(false)
}

// =============================================================================
// Mounting
// =============================================================================

/// Mount the page.
///
/// The navigator comes up first so a fragment present at load force-mounts
/// its section during assembly; the first scroll attempt still waits for
/// the next animation frame.
pub fn mount_page(
    env: Rc<dyn Environment>,
    config: PageConfig,
    sections: PageSections,
) -> PageHandle {
    let navigator = Navigator::mount(env.clone(), config.retry);

    // Eager hero, anchored as "home".
    let hero_index = allocate_index(Some("home"));
    let hero_region = env.insert_region(PLACEHOLDER_MIN_HEIGHT);
    env.set_region_id(hero_region, Some("home"));
    let hero_cleanup = (sections.hero)(hero_region);

    let margins = config.margins;
    let about = deferred(
        env.clone(),
        margins.margin_for(SectionId::About),
        navigator.force_flag(SectionId::About),
        sections.about,
    );
    let skills = deferred(
        env.clone(),
        margins.margin_for(SectionId::Skills),
        navigator.force_flag(SectionId::Skills),
        sections.skills,
    );
    let projects = deferred(
        env.clone(),
        margins.margin_for(SectionId::Projects),
        navigator.force_flag(SectionId::Projects),
        sections.projects,
    );
    let contact = deferred(
        env.clone(),
        margins.margin_for(SectionId::Contact),
        navigator.force_flag(SectionId::Contact),
        sections.contact,
    );
    // The footer is not a navigation target; proximity is its only way in.
    let footer = deferred(env.clone(), margins.footer, || false, sections.footer);

    let progress = track_progress(&env);
    let pointer = track_pointer(&env);

    debug!(section = ?navigator.target(), "page mounted");

    PageHandle {
        navigator: Some(navigator),
        hero_cleanup: Some(hero_cleanup),
        hero_region,
        hero_index,
        about: Some(about),
        skills: Some(skills),
        projects: Some(projects),
        contact: Some(contact),
        footer: Some(footer),
        progress: Some(progress),
        pointer: Some(pointer),
        env,
    }
}

// =============================================================================
// Tests
// =============================================================================
