//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations/`
//! exactly; `diesel print-schema` can regenerate them from a live database.

diesel::table! {
    /// User accounts.
    ///
    /// Identity columns are written by the identity provider; `points` and
    /// the `password_reset_*` pair are owned by the engagement core.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique contact email, also the display handle.
        email -> Varchar,
        /// Optional phone contact.
        phone -> Nullable<Varchar>,
        /// Short language code from the supported set.
        preferred_language -> Varchar,
        /// Transferable points balance; CHECK (points >= 0).
        points -> Int4,
        /// Password resets consumed in the current period.
        password_reset_count -> Int4,
        /// Start of the current reset period, if any reset ever happened.
        password_reset_at -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Questions posted to the board.
    questions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Posting user.
        author_id -> Uuid,
        /// Short summary line.
        title -> Varchar,
        /// Full question text.
        body -> Text,
        /// Stored video path, when a video was attached.
        video_url -> Nullable<Varchar>,
        /// Creation timestamp; the board lists newest first.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Answers to questions.
    answers (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The answered question.
        question_id -> Uuid,
        /// Posting user.
        author_id -> Uuid,
        /// Answer text.
        body -> Text,
        /// Upvote count; CHECK (upvotes >= 0), mutated only by the atomic
        /// increment.
        upvotes -> Int4,
        /// Creation timestamp; answers list oldest first.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only points transfer audit trail.
    points_transfers (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Sending user.
        from_user_id -> Uuid,
        /// Receiving user.
        to_user_id -> Uuid,
        /// Points moved; CHECK (amount > 0).
        amount -> Int4,
        /// When the transfer was applied.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only sign-in audit trail.
    login_history (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The user who signed in.
        user_id -> Uuid,
        /// Coarse device classification code.
        device_class -> Varchar,
        /// Raw user-agent string.
        user_agent -> Varchar,
        /// Reported platform, if any.
        platform -> Nullable<Varchar>,
        /// Peer address as seen by the server.
        address -> Nullable<Varchar>,
        /// Sign-in instant.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(questions -> users (author_id));
diesel::joinable!(answers -> users (author_id));
diesel::joinable!(answers -> questions (question_id));
diesel::joinable!(login_history -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    questions,
    answers,
    points_transfers,
    login_history,
);
