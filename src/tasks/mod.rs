pub mod question_timer;
