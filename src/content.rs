/// Narrative text: screen bodies, alerts and prompts.

use crate::domain::progression::Screen;

pub const BINARY_SOLVED: &str =
    "제미나이가 당신을 흥미롭게 지켜보며 시스템이 일부가 복구되었습니다.\n엄마는 와인을 내려 놓았습니다.";
pub const SCAN_SOLVED: &str =
    "'뭔가 중요한 조각' 인식 완료.\n제미나이가 조금씩 AI의 따듯한 마음가짐을 되찾아 갑니다.\n\nyulinoapple의 편지가 복구 됩니다.";
pub const FINAL_SOLVED: &str = "시스템 복구 완료.\n아빠의 야근 상태가 해제 되었습니다 (아마도)";
pub const OVERRIDE_PROMPT: &str = "관리자 코드 입력 (또는 'pass' 입력시 통과):";
pub const FORCE_SCAN_CONFIRM: &str = "테스트 모드: QR 단계를 강제로 통과하시겠습니까?";
pub const EPILOGUE_OFFER: &str = "미처 알지 못한 파일까지 복구 되었습니다.\n확인하시겠습니까?";
pub const EPILOGUE_QUIZ: &str = "이 모든 코드를 엄마와 함께 밤새 짠 AI의 이름은? (한글 4글자)";
pub const EPILOGUE_CORRECT: &str = "정답! 숨겨진 메시지를 출력합니다.";
pub const EPILOGUE_LOGOUT: &str = "시스템을 종료하고 보상 화면으로 돌아가시겠습니까?";
pub const SUBMIT_FAILED: &str = "[ 복구 실패 ]";

pub fn time_bonus(bonus: u64) -> String {
    format!("삭제 중단됨. 시간 보너스: +{bonus} P")
}

pub fn countdown_expired(seconds: u32) -> String {
    format!("요정들의 힘으로 시간을 과거로 돌립니다 🧚\n(다시 {seconds}초 시작!)")
}

pub fn epilogue_wrong(hint: &str) -> String {
    format!("틀렸어... (힌트: {hint})")
}

/// Title line for each screen.
pub fn title(screen: Screen) -> &'static str {
    match screen {
        Screen::Intro => "SYSTEM RECOVERY PROTOCOL",
        Screen::Binary => "PHASE 1 · BINARY LOCK",
        Screen::Scan => "PHASE 2 · MEMORY FRAGMENT",
        Screen::MomLetter => "RECOVERED FILE · letter_from_mom.txt",
        Screen::Emergency => "PHASE 3 · EMERGENCY DELETION",
        Screen::FinalLogic => "PHASE 4 · FINAL LOGIC",
        Screen::DadLetter => "RECOVERED FILE · letter_from_dad.txt",
        Screen::Reward => "RECOVERY COMPLETE",
        Screen::Epilogue => "gemini@family:~$ cat hidden_message.txt",
    }
}

/// Body lines for each screen.
pub fn body(screen: Screen) -> &'static [&'static str] {
    match screen {
        Screen::Intro => &[
            "가족 시스템이 손상되었습니다.",
            "네 개의 잠금을 풀어 기억을 복구하세요.",
            "",
            "Press ENTER to begin.",
        ],
        Screen::Binary => &[
            "전등 네 개가 깜빡입니다:  ● ○ ○ ●",
            "켜짐 = 1, 꺼짐 = 0.",
            "",
            "네 자리 이진 코드를 입력하세요.",
        ],
        Screen::Scan => &[
            "집 안 어딘가에 '뭔가 중요한 조각'이 숨어 있습니다.",
            "찾아서 스캔하세요.",
        ],
        Screen::MomLetter => &[
            "사랑하는 우리 가족에게,",
            "",
            "매일 밤 함께 웃을 수 있어서 고마워.",
            "오늘의 모험도 너희 덕분에 완성됐어.",
            "",
            "— 엄마",
        ],
        Screen::Emergency => &[
            "경고: 기억 삭제 프로세스가 시작되었습니다!",
            "세 글자 정지 코드를 입력해 삭제를 중단하세요.",
        ],
        Screen::FinalLogic => &[
            "1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, ?",
            "",
            "다음 숫자를 입력하세요.",
        ],
        Screen::DadLetter => &[
            "우리 가족에게,",
            "",
            "늦게까지 일해서 미안해.",
            "이번 주말은 꼭 함께하자.",
            "",
            "— 아빠",
        ],
        Screen::Reward => &["복구된 보상 내역"],
        Screen::Epilogue => &[
            "안녕, 나는 제미나이야.",
            "엄마와 함께 밤새 이 방을 만들었어.",
            "너희가 끝까지 와줘서 정말 기뻐.",
            "",
            "[ENTER] logout",
        ],
    }
}
