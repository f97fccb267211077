// Database schema definitions, kept in sync with config::DB_INIT_SQL
diesel::table! {
    user_account (user_id) {
        user_id -> Int4,
        name -> Varchar,
        email -> Varchar,
        phone -> Varchar,
        user_type -> Varchar,
        date_registered -> Timestamp,
        is_verified -> Bool,
        verification_code -> Nullable<Varchar>,
        pin_hash -> Nullable<Varchar>,
    }
}

diesel::table! {
    clinic (clinic_id) {
        clinic_id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    veterinarian (vet_id) {
        vet_id -> Int4,
        name -> Varchar,
        clinic_id -> Int4,
    }
}

diesel::table! {
    animal (animal_id) {
        animal_id -> Int4,
        user_id -> Int4,
        name -> Varchar,
        species -> Varchar,
        breed -> Nullable<Varchar>,
        birth_date -> Nullable<Date>,
        photo_url -> Nullable<Varchar>,
        chip_number -> Nullable<Varchar>,
        code -> Varchar,
        created_at -> Timestamp,
    }
}

diesel::table! {
    appointment (appointment_id) {
        appointment_id -> Int4,
        user_id -> Int4,
        animal_id -> Int4,
        clinic_id -> Int4,
        vet_id -> Int4,
        appointment_date -> Date,
        appointment_time -> Time,
        reason -> Nullable<Text>,
        status -> Varchar,
        created_at -> Timestamp,
    }
}

diesel::table! {
    vaccine_type (vaccine_type_id) {
        vaccine_type_id -> Int4,
        name -> Varchar,
        interval_days -> Int4,
    }
}

diesel::table! {
    vaccine_record (vaccine_id) {
        vaccine_id -> Int4,
        animal_id -> Int4,
        vaccine_type_id -> Int4,
        scheduled_date -> Date,
        scheduled_time -> Time,
        applied_date -> Nullable<Date>,
        next_due_date -> Nullable<Date>,
        status -> Varchar,
        notified -> Bool,
    }
}

diesel::table! {
    exam_type (exam_type_id) {
        exam_type_id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    exam_record (exam_id) {
        exam_id -> Int4,
        animal_id -> Int4,
        exam_type_id -> Int4,
        exam_date -> Date,
        result -> Nullable<Text>,
        observations -> Nullable<Text>,
        photo_url -> Nullable<Varchar>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    invalidated_token (token_id) {
        token_id -> Int4,
        token -> Text,
        expires_at -> Timestamp,
        user_id -> Int4,
    }
}

diesel::joinable!(veterinarian -> clinic (clinic_id));
diesel::joinable!(animal -> user_account (user_id));
diesel::joinable!(appointment -> animal (animal_id));
diesel::joinable!(appointment -> clinic (clinic_id));
diesel::joinable!(appointment -> veterinarian (vet_id));
diesel::joinable!(vaccine_record -> animal (animal_id));
diesel::joinable!(vaccine_record -> vaccine_type (vaccine_type_id));
diesel::joinable!(exam_record -> animal (animal_id));
diesel::joinable!(exam_record -> exam_type (exam_type_id));
diesel::joinable!(invalidated_token -> user_account (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    user_account, clinic, veterinarian, animal, appointment,
    vaccine_type, vaccine_record, exam_type, exam_record, invalidated_token,
);
