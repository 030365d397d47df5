//! [`Document`] definitions.

use common::{define_kind, define_text, unit, DateTime, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    milestone::{DocumentKind, Milestone},
    plot,
};
#[cfg(doc)]
use crate::domain::{Installment, Plot};

/// Document issued for a [`Plot`] once a [`Milestone`] is reached.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Document {
    /// ID of this [`Document`].
    pub id: Id,

    /// ID of the [`Plot`] this [`Document`] is issued for.
    pub plot_id: plot::Id,

    /// [`Milestone`] this [`Document`] is issued at.
    pub milestone: Milestone,

    /// [`Status`] of this [`Document`].
    pub status: Status,

    /// Total amount paid for the [`Plot`] when the [`Milestone`] was reached.
    pub amount_paid: Money,

    /// [`Reference`] of the generated file, once generated.
    pub reference: Option<Reference>,

    /// [`DateTime`] when this [`Document`] was generated, if it was.
    pub generated_at: Option<GenerationDateTime>,

    /// [`DateTime`] when this [`Document`] was approved, if it was.
    pub approved_at: Option<ApprovalDateTime>,

    /// [`Approver`] of this [`Document`], if approved.
    pub approved_by: Option<Approver>,

    /// [`Notes`] left on approval, if any.
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Document`] was created.
    pub created_at: CreationDateTime,
}

impl Document {
    /// Creates a new [`Status::Ready`] [`Document`] awaiting generation.
    #[must_use]
    pub fn ready(
        plot_id: plot::Id,
        milestone: Milestone,
        amount_paid: Money,
    ) -> Self {
        Self {
            id: Id::new(),
            plot_id,
            milestone,
            status: Status::Ready,
            amount_paid,
            reference: None,
            generated_at: None,
            approved_at: None,
            approved_by: None,
            notes: None,
            created_at: DateTime::now().coerce(),
        }
    }

    /// Returns the [`DocumentKind`] of this [`Document`].
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.milestone.document
    }

    /// Attaches the generated file [`Reference`] to this [`Document`].
    ///
    /// # Errors
    ///
    /// If this [`Document`] is not [`Status::Ready`].
    pub fn generate(
        &mut self,
        reference: Reference,
        at: GenerationDateTime,
    ) -> Result<(), TransitionError> {
        self.transition(Status::Generated)?;
        self.reference = Some(reference);
        self.generated_at = Some(at);
        Ok(())
    }

    /// Approves this [`Document`].
    ///
    /// # Errors
    ///
    /// If this [`Document`] is not [`Status::Generated`].
    pub fn approve(
        &mut self,
        approver: Approver,
        notes: Option<Notes>,
        at: ApprovalDateTime,
    ) -> Result<(), TransitionError> {
        self.transition(Status::Approved)?;
        self.approved_by = Some(approver);
        self.notes = notes;
        self.approved_at = Some(at);
        Ok(())
    }

    /// Moves this [`Document`] one step forward.
    fn transition(&mut self, to: Status) -> Result<(), TransitionError> {
        let allowed = matches!(
            (self.status, to),
            (Status::Ready, Status::Generated)
                | (Status::Generated, Status::Approved)
        );
        if !allowed {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// ID of a [`Document`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Status of a [`Document`]."]
    enum Status {
        #[doc = "[`Milestone`] is reached, the file is not generated yet."]
        Ready = 1,

        #[doc = "File is generated and awaits approval."]
        Generated = 2,

        #[doc = "File is approved by the staff."]
        Approved = 3,
    }
}

/// Error of a disallowed [`Document`] [`Status`] transition.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`Document` cannot become `{to}` from `{from}`")]
pub struct TransitionError {
    /// [`Status`] the [`Document`] is in.
    pub from: Status,

    /// [`Status`] the [`Document`] was asked to move into.
    pub to: Status,
}

define_text! {
    #[doc = "Opaque reference (URI) of a stored file."]
    struct Reference(max_len = 1024);
}

impl Reference {
    /// Generates a new unique [`Reference`] of a [`Document`] file of the
    /// provided [`DocumentKind`].
    #[must_use]
    pub fn generate(kind: DocumentKind) -> Self {
        Self(format!("/documents/{kind}/{}.pdf", Uuid::new_v4()))
    }

    /// Generates a new unique [`Reference`] of a payment receipt of an
    /// [`Installment`].
    #[must_use]
    pub fn receipt() -> Self {
        Self(format!("/receipts/{}.pdf", Uuid::new_v4()))
    }
}

define_text! {
    #[doc = "Name of whoever approved a [`Document`]."]
    struct Approver(max_len = 256);
}

define_text! {
    #[doc = "Free-form notes left on [`Document`] approval."]
    struct Notes(max_len = 4096);
}

/// [`DateTime`] when a [`Document`] was created.
pub type CreationDateTime = DateTimeOf<(Document, unit::Creation)>;

/// Marker type indicating [`Document`] generation.
#[derive(Clone, Copy, Debug)]
pub struct Generation;

/// [`DateTime`] when a [`Document`] was generated.
pub type GenerationDateTime = DateTimeOf<(Document, Generation)>;

/// Marker type indicating [`Document`] approval.
#[derive(Clone, Copy, Debug)]
pub struct Approval;

/// [`DateTime`] when a [`Document`] was approved.
pub type ApprovalDateTime = DateTimeOf<(Document, Approval)>;

#[cfg(test)]
mod spec {
    use common::{Currency, DateTime, Money};

    use crate::domain::{
        milestone::{DocumentKind, Milestone},
        plot,
    };

    use super::{Approver, Document, Reference, Status};

    fn document() -> Document {
        Document::ready(
            plot::Id::new(),
            Milestone::of_document(DocumentKind::Possession),
            Money::zero(Currency::Pkr),
        )
    }

    #[test]
    fn references_are_unique_per_kind() {
        let a = Reference::generate(DocumentKind::Allotment);
        let b = Reference::generate(DocumentKind::Allotment);

        assert_ne!(a, b);
        assert!(a.as_ref().starts_with("/documents/allotment/"));
        assert!(a.as_ref().ends_with(".pdf"));
        assert!(Reference::receipt().as_ref().starts_with("/receipts/"));
    }

    #[test]
    fn goes_through_workflow_in_order() {
        let mut doc = document();
        let approver = Approver::new("Legal Desk").unwrap();

        assert!(doc
            .approve(approver.clone(), None, DateTime::now().coerce())
            .is_err());
        assert_eq!(doc.status, Status::Ready);

        doc.generate(
            Reference::generate(doc.kind()),
            DateTime::now().coerce(),
        )
        .unwrap();
        assert_eq!(doc.status, Status::Generated);
        assert!(doc.reference.is_some());

        assert!(doc
            .generate(Reference::generate(doc.kind()), DateTime::now().coerce())
            .is_err());

        doc.approve(approver, None, DateTime::now().coerce()).unwrap();
        assert_eq!(doc.status, Status::Approved);
        assert!(doc.approved_at.is_some());
    }
}
