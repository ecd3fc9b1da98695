// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_API_BASE_URL: &str = "https://man-m681.onrender.com";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_LOG_FILTER: &str = "ngo_dashboard=info,tower_http=info";

// Session configuration
pub const SESSION_NAME: &str = "ngo_session";
pub const SESSION_EXPIRY_DAYS: i64 = 7;
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;
pub const SESSION_ROLE_KEY: &str = "role";
pub const SESSION_FLASH_KEY: &str = "flash";

// Display
pub const CURRENCY: &str = "UGX";
pub const RECENT_DONATIONS_LIMIT: usize = 10;
pub const GENERAL_FUND: &str = "General Fund";
pub const NOT_AVAILABLE: &str = "N/A";

// Status values understood by the backend
pub const DONATION_STATUS_COMPLETED: &str = "completed";
pub const ACTIVITY_STATUS_PLANNED: &str = "planned";
pub const ACTIVITY_STATUS_PENDING_APPROVAL: &str = "pending approval";
pub const BUDGET_STATUS_DRAFT: &str = "draft";
pub const BUDGET_STATUS_SUBMITTED: &str = "submitted";
pub const BUDGET_STATUS_APPROVED: &str = "approved";
pub const BUDGET_STATUS_REJECTED: &str = "rejected";
pub const APPROVAL_STATUS_PENDING: &str = "pending";

// Names recorded on activity approval requests and decisions
pub const ACTIVITY_APPROVAL_REQUESTER: &str = "Head of Programs";
pub const ACTIVITY_APPROVAL_APPROVER: &str = "Director";

// Choice lists for form selects
pub const PAYMENT_METHODS: &[(&str, &str)] = &[
    ("cash", "Cash"),
    ("mobile_money", "Mobile Money"),
    ("bank_transfer", "Bank Transfer"),
    ("western_union", "Western Union"),
    ("paypal", "PayPal"),
    ("other", "Other"),
];
pub const BUDGET_CATEGORIES: &[(&str, &str)] = &[
    ("materials", "Materials"),
    ("labor", "Labor"),
    ("transport", "Transport"),
    ("equipment", "Equipment"),
    ("other", "Other"),
];
pub const ACTIVITY_STATUSES: &[(&str, &str)] = &[
    ("planned", "Planned"),
    ("draft", "Draft"),
    ("pending approval", "Pending Approval"),
    ("approved", "Approved"),
    ("rejected", "Rejected"),
];
pub const DONOR_TYPES: &[(&str, &str)] = &[
    ("individual", "Individual"),
    ("organization", "Organization"),
    ("corporate", "Corporate"),
    ("foundation", "Foundation"),
];
pub const DONOR_CATEGORIES: &[(&str, &str)] = &[
    ("one-time", "One-time"),
    ("regular", "Regular"),
    ("major", "Major"),
];

// Receipt letterhead
pub const ORG_NAME: &str = "RWENZORI COMMUNITY DEVELOPMENT NETWORK (RCDNET)";
pub const ORG_SHORT_NAME: &str = "RCDNET";
pub const ORG_LETTERHEAD_LINES: &[&str] = &[
    "Receipt issued at RCDNET",
    "P.O.Box 558, Kasese, Western Uganda",
    "Tax ID No. 1027222682",
    "Registration No: 808593",
    "Community Registration No. CE/CBS/008",
];
pub const ORG_CONTACT_LINES: &[&str] = &[
    "For enquiries call +256 704240309 or email to info@rwenzori-development.org",
    "Website: www.rwenzori-development.org",
];
pub const RECEIPT_EMAIL_RECIPIENT: &str = "rcdnetciuganda@gmail.com";
pub const RECEIPT_EMAIL_SUBJECT: &str = "Donation acknowledgement";
pub const RECEIPT_EMAIL_BODY: &str = "Dear Donor, we are thrilled to receive your generous support. Your donation has been well received. Kindly find the donation confirmation attached here in. With kind regards. Mrs. Muhindo Justine. Board treasurer";
pub const GMAIL_COMPOSE_URL: &str = "https://mail.google.com/mail/?view=cm&fs=1";
pub const HTML2PDF_SCRIPT_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/html2pdf.js/0.10.1/html2pdf.bundle.min.js";

// External pages for roles without an in-app dashboard
pub const HUMAN_RESOURCE_URL: &str = "https://dariusmumbere.github.io/ngo/roles.html";
pub const FINANCE_URL: &str = "https://dariusmumbere.github.io/ngo/finance.html";

// Error messages
pub const ERR_REASON_REQUIRED: &str = "A reason is required to reject";
pub const ERR_INVALID_EMAIL: &str = "Please enter a valid email address";
pub const ERR_INVALID_PHONE: &str = "Please enter a valid phone number";
pub const ERR_INVALID_APPROVED_AMOUNT: &str = "Please enter a valid approved amount";
pub const ERR_INVALID_REQUESTED_AMOUNT: &str = "Please enter a valid amount";
pub const ERR_UNKNOWN_ROLE: &str = "Unknown role";
pub const ERR_UNKNOWN_ACTION: &str = "Unknown action";
pub const ERR_NAME_REQUIRED: &str = "Please enter a name";
pub const ERR_NO_FILE_SELECTED: &str = "Please choose a file to upload";
pub const ERR_UPLOAD_TOO_LARGE: &str = "File is too large to upload";
pub const ERR_SESSION: &str = "Session error";
